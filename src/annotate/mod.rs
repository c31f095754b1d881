pub mod descendants;
pub mod lca;
pub mod monophyly;
pub mod palette;
pub mod records;

pub use descendants::DescendantLeaves;
pub use lca::{lca_reference, taxon_lcas, LcaReference, TaxonLca, TaxonLcaMap};
pub use monophyly::{label_monophyletic_groups, TaxLabels, TaxonLabel};
pub use palette::{color_ramp, get_phylum_colours, PaletteOptions, PhylumPalette, Rgb};
pub use records::{DecorationRecords, LabelGroup, NodeColour};

use crate::error::{Diagnostics, Result};
use crate::taxonomy::LineageTable;
use crate::tree::Tree;

/// Side tables derived from a tree and its lineages.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub descendants: DescendantLeaves,
    pub labels: TaxLabels,
    pub taxon_lca: TaxonLcaMap,
}

impl Annotation {
    pub fn compute(tree: &Tree, lineages: &LineageTable) -> Result<Self> {
        let descendants = DescendantLeaves::propagate(tree);
        let labels = label_monophyletic_groups(tree, &descendants, lineages)?;
        let taxon_lca = taxon_lcas(tree, &descendants, lineages)?;
        Ok(Self {
            descendants,
            labels,
            taxon_lca,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Decoration {
    pub annotation: Annotation,
    pub records: DecorationRecords,
    pub diagnostics: Diagnostics,
}

/// Runs the whole annotation: propagation, labeling, LCAs, palette and records.
pub fn decorate(tree: &Tree, lineages: &LineageTable, options: &PaletteOptions) -> Result<Decoration> {
    let annotation = Annotation::compute(tree, lineages)?;
    let mut diagnostics = Diagnostics::new();
    let records = DecorationRecords::build(tree, &annotation, lineages, options, &mut diagnostics);

    tracing::info!(
        labeled_nodes = annotation.labels.labeled_count(),
        taxa_with_lca = annotation.taxon_lca.len(),
        phyla = records.palette.len(),
        diagnostics = diagnostics.len(),
        "decorated tree"
    );

    Ok(Decoration {
        annotation,
        records,
        diagnostics,
    })
}
