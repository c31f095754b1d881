pub mod itol;

use crate::annotate::{Decoration, LabelGroup, LcaReference, NodeColour, PhylumPalette};
use crate::taxonomy::TaxonRank;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

pub const RECORD_TYPE: &str = "org.gtdb.itol.decoration";
pub const EXPORT_VERSION: &str = "1.0";

/// Root structure of the JSON summary.
#[derive(Debug, Serialize)]
pub struct DecorationExport<'a> {
    #[serde(rename = "$type")]
    pub record_type: String,

    pub version: String,
    #[serde(serialize_with = "serialize_datetime")]
    pub created_at: DateTime<Utc>,
    pub tool_version: String,

    pub inputs: ExportInputs,
    pub leaf_count: usize,
    pub phylum_lca: &'a IndexMap<String, Vec<LcaReference>>,
    pub palette: &'a PhylumPalette,
    pub internal_labels: &'a IndexMap<String, LabelGroup>,
    pub node_colours: &'a [NodeColour],
    pub collapse_groups: IndexMap<TaxonRank, Vec<&'a LcaReference>>,
    pub taxon_lca: IndexMap<&'a str, TaxonLcaExport<'a>>,
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportInputs {
    pub tree: String,
    pub taxonomy: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaxonLcaExport<'a> {
    pub rank: TaxonRank,
    pub genomes: usize,
    pub reference: Option<&'a LcaReference>,
}

impl<'a> DecorationExport<'a> {
    pub fn new(
        inputs: ExportInputs,
        decoration: &'a Decoration,
        collapse_ranks: &[TaxonRank],
    ) -> Self {
        let records = &decoration.records;
        let taxon_lca = decoration
            .annotation
            .taxon_lca
            .iter()
            .map(|(name, lca)| {
                (
                    name.as_str(),
                    TaxonLcaExport {
                        rank: lca.rank,
                        genomes: lca.genomes,
                        reference: records.taxon_lca.get(name),
                    },
                )
            })
            .collect();

        Self {
            record_type: RECORD_TYPE.to_string(),
            version: EXPORT_VERSION.to_string(),
            created_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            inputs,
            leaf_count: decoration.annotation.descendants.leaf_count(),
            phylum_lca: &records.phylum_lca,
            palette: &records.palette,
            internal_labels: &records.internal_labels,
            node_colours: &records.node_colours,
            collapse_groups: collapse_ranks
                .iter()
                .map(|rank| (*rank, records.collapse_groups(*rank)))
                .collect(),
            taxon_lca,
            diagnostics: decoration.diagnostics.iter().map(|d| d.to_string()).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn serialize_datetime<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.to_rfc3339())
}
