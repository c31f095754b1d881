use super::lca::{lca_reference, LcaReference};
use super::monophyly::{TaxLabels, TaxonLabel};
use super::palette::{get_phylum_colours, PaletteOptions, PhylumPalette, Rgb};
use super::Annotation;
use crate::error::Diagnostics;
use crate::taxonomy::{LineageTable, TaxonRank};
use crate::tree::Tree;
use indexmap::IndexMap;
use serde::Serialize;

/// Nodes sharing one compound label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelGroup {
    pub labels: Vec<TaxonLabel>,
    pub references: Vec<LcaReference>,
}

impl LabelGroup {
    pub fn first_rank(&self) -> Option<TaxonRank> {
        self.labels.first().map(|l| l.rank)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeColour {
    pub reference: LcaReference,
    pub colour: Rgb,
    pub label: String,
    pub rank: TaxonRank,
    pub phylum: String,
}

/// Everything the exporters need from a labeled tree.
#[derive(Debug, Clone)]
pub struct DecorationRecords {
    pub phylum_lca: IndexMap<String, Vec<LcaReference>>,
    pub palette: PhylumPalette,
    pub internal_labels: IndexMap<String, LabelGroup>,
    pub node_colours: Vec<NodeColour>,
    /// Reference of every taxon's LCA node, keyed like `Annotation::taxon_lca`.
    pub taxon_lca: IndexMap<String, LcaReference>,
}

impl DecorationRecords {
    pub fn build(
        tree: &Tree,
        annotation: &Annotation,
        lineages: &LineageTable,
        options: &PaletteOptions,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let labels = &annotation.labels;
        let phylum_lca = phylum_lca_record(tree, labels, diagnostics);

        // Phyla with an LCA first, then any others in leaf order, so every
        // labeled node can find a ramp.
        let leaf_phyla = annotation
            .descendants
            .leaves(tree.root())
            .iter()
            .filter_map(|leaf| tree.node(*leaf).genome_id())
            .filter_map(|gid| lineages.get(gid))
            .map(|lineage| lineage.phylum());
        let palette = get_phylum_colours(
            phylum_lca.keys().map(String::as_str).chain(leaf_phyla),
            options,
        );

        let internal_labels = internal_label_record(tree, labels, diagnostics);
        let node_colours = node_colour_record(tree, labels, &palette, lineages, diagnostics);

        let taxon_lca = annotation
            .taxon_lca
            .iter()
            .map(|(name, lca)| (name.clone(), lca_reference(tree, lca.node, diagnostics)))
            .collect();

        Self {
            phylum_lca,
            palette,
            internal_labels,
            node_colours,
            taxon_lca,
        }
    }

    pub fn collapse_groups(&self, rank: TaxonRank) -> Vec<&LcaReference> {
        collapse_groups(&self.internal_labels, rank)
    }
}

/// The phylum a node's labels start with: a leading phylum label, or a
/// domain label directly followed by a phylum label.
fn leading_phylum(labels: &[TaxonLabel]) -> Option<&str> {
    match labels {
        [first, ..] if first.rank == TaxonRank::Phylum => Some(first.name.as_str()),
        [first, second, ..] if first.rank == TaxonRank::Domain && second.rank == TaxonRank::Phylum => {
            Some(second.name.as_str())
        }
        _ => None,
    }
}

/// Phylum name to the references of every node that is the LCA of that
/// phylum, in post-order. A phylum broken up by other lineages appears once
/// per monophyletic piece.
pub fn phylum_lca_record(
    tree: &Tree,
    labels: &TaxLabels,
    diagnostics: &mut Diagnostics,
) -> IndexMap<String, Vec<LcaReference>> {
    let mut out: IndexMap<String, Vec<LcaReference>> = IndexMap::new();
    for id in tree.postorder() {
        if let Some(phylum) = leading_phylum(labels.get(id)) {
            out.entry(phylum.to_string())
                .or_default()
                .push(lca_reference(tree, id, diagnostics));
        }
    }
    out
}

pub fn internal_label_record(
    tree: &Tree,
    labels: &TaxLabels,
    diagnostics: &mut Diagnostics,
) -> IndexMap<String, LabelGroup> {
    let mut out: IndexMap<String, LabelGroup> = IndexMap::new();
    for id in tree.preorder() {
        let Some(compound) = labels.compound(id) else {
            continue;
        };
        let reference = lca_reference(tree, id, diagnostics);
        out.entry(compound)
            .or_insert_with(|| LabelGroup {
                labels: labels.get(id).to_vec(),
                references: Vec::new(),
            })
            .references
            .push(reference);
    }
    out
}

/// Colour of every node labeled below domain. A node first labeled below
/// phylum sits inside a clade uniform at phylum, so its leftmost genome
/// names the phylum.
pub fn node_colour_record(
    tree: &Tree,
    labels: &TaxLabels,
    palette: &PhylumPalette,
    lineages: &LineageTable,
    diagnostics: &mut Diagnostics,
) -> Vec<NodeColour> {
    let mut out = Vec::new();
    for id in tree.preorder() {
        let node_labels = labels.get(id);
        let Some(highest) = node_labels.first() else {
            continue;
        };
        if highest.rank == TaxonRank::Domain {
            continue;
        }

        let phylum = if highest.rank == TaxonRank::Phylum {
            highest.name.as_str()
        } else {
            let leaf = tree.node(tree.first_leaf(id));
            match leaf.genome_id().and_then(|gid| lineages.get(gid)) {
                Some(lineage) => lineage.phylum(),
                None => {
                    tracing::warn!(taxon = %highest.name, "no phylum known for taxon, node left uncoloured");
                    continue;
                }
            }
        };

        let Some(colour) = palette.shade(phylum, highest.rank) else {
            tracing::warn!(phylum, "phylum has no palette entry, node left uncoloured");
            continue;
        };

        out.push(NodeColour {
            reference: lca_reference(tree, id, diagnostics),
            colour,
            label: labels.compound(id).unwrap_or_default(),
            rank: highest.rank,
            phylum: phylum.to_string(),
        });
    }
    out
}

/// Groups at `rank` that a viewer can collapse: compound labels starting at
/// that rank whose node spans more than one genome.
pub fn collapse_groups(internal_labels: &IndexMap<String, LabelGroup>, rank: TaxonRank) -> Vec<&LcaReference> {
    internal_labels
        .values()
        .filter(|group| group.first_rank() == Some(rank))
        .flat_map(|group| group.references.iter())
        .filter(|reference| reference.is_pair())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::palette::TABLEAU_20;
    use crate::taxonomy::Lineage;
    use crate::tree::parse_newick;
    use std::collections::HashMap;

    fn table(entries: &[(&str, &str)]) -> LineageTable {
        let mut table = LineageTable::new();
        for (gid, taxonomy) in entries {
            table.insert(*gid, Lineage::parse(taxonomy).unwrap());
        }
        table
    }

    fn build(newick: &str, lineages: &LineageTable) -> (Tree, DecorationRecords, Diagnostics) {
        let tree = parse_newick(newick).unwrap();
        let annotation = Annotation::compute(&tree, lineages).unwrap();
        let mut diagnostics = Diagnostics::new();
        let records = DecorationRecords::build(
            &tree,
            &annotation,
            lineages,
            &PaletteOptions::default(),
            &mut diagnostics,
        );
        (tree, records, diagnostics)
    }

    #[test]
    fn test_domain_phylum_coincidence() {
        // The Archaea side is a single phylum, so its node is labeled d__A;p__a;...
        let lineages = table(&[
            ("A1", "d__A;p__a;c__a;o__a;f__a;g__a;s__a1"),
            ("A2", "d__A;p__a;c__a;o__a;f__a;g__a;s__a2"),
            ("B1", "d__B;p__b;c__b;o__b;f__b;g__b;s__b1"),
            ("B2", "d__B;p__c;c__c;o__c;f__c;g__c;s__c1"),
        ]);
        let (_, records, _) = build("((A1,A2)arc,(B1,B2)bac);", &lineages);

        assert_eq!(records.phylum_lca["p__a"], vec![LcaReference::Pair("A1".into(), "A2".into())]);
        // single-genome phyla are referenced by their leaf
        assert_eq!(records.phylum_lca["p__b"], vec![LcaReference::Leaf("B1".into())]);
        assert_eq!(records.phylum_lca["p__c"], vec![LcaReference::Leaf("B2".into())]);
        assert!(records.internal_labels.contains_key("d__B"));
    }

    #[test]
    fn test_phylum_split_into_two_groups() {
        let lineages = table(&[
            ("A", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
            ("B", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
            ("C", "d__B;p__2;c__2;o__2;f__2;g__2;s__2"),
            ("D", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
            ("E", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
        ]);
        let (_, records, _) = build("(((A,B),C),(D,E));", &lineages);

        assert_eq!(
            records.phylum_lca["p__1"],
            vec![
                LcaReference::Pair("A".into(), "B".into()),
                LcaReference::Pair("D".into(), "E".into()),
            ]
        );
        let group = &records.internal_labels["p__1;c__1;o__1;f__1;g__1;s__1"];
        assert_eq!(group.references.len(), 2);
        assert_eq!(group.first_rank(), Some(TaxonRank::Phylum));
    }

    #[test]
    fn test_node_colours_use_highest_rank_shade() {
        let lineages = table(&[
            ("A", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
            ("B", "d__B;p__1;c__1;o__1;f__1;g__1;s__2"),
            ("C", "d__B;p__1;c__3;o__3;f__3;g__3;s__3"),
            ("D", "d__B;p__2;c__4;o__4;f__4;g__4;s__4"),
        ]);
        let (_, records, _) = build("(((A,B)ab,C)abc,D);", &lineages);

        let by_label: HashMap<&str, &NodeColour> = records
            .node_colours
            .iter()
            .map(|c| (c.label.as_str(), c))
            .collect();

        let abc = by_label["p__1"];
        assert_eq!(abc.colour, records.palette.base("p__1").unwrap());
        assert_eq!(abc.reference.to_string(), "A|C");

        let ab = by_label["c__1;o__1;f__1;g__1"];
        assert_eq!(ab.rank, TaxonRank::Class);
        assert_eq!(ab.phylum, "p__1");
        assert_eq!(ab.colour, records.palette.ramp("p__1").unwrap()[1]);

        let a = by_label["s__1"];
        assert_eq!(a.colour, records.palette.ramp("p__1").unwrap()[5]);

        // the root is only labeled at domain and gets no colour
        assert!(records.node_colours.iter().all(|c| c.rank != TaxonRank::Domain));
    }

    #[test]
    fn test_node_colour_phylum_comes_from_own_genomes() {
        // c__X is reused under two phyla; each clade keeps its own ramp
        let lineages = table(&[
            ("A", "d__B;p__1;c__X;o__1;f__1;g__1;s__1"),
            ("B", "d__B;p__1;c__X;o__1;f__1;g__1;s__2"),
            ("E", "d__B;p__1;c__E;o__E;f__E;g__E;s__E"),
            ("C", "d__B;p__2;c__X;o__2;f__2;g__2;s__3"),
            ("D", "d__B;p__2;c__X;o__2;f__2;g__2;s__4"),
        ]);
        for _ in 0..20 {
            let (_, records, _) = build("(((A,B)ab,E)pe,(C,D)cd);", &lineages.clone());
            let ab = records
                .node_colours
                .iter()
                .find(|c| c.label == "c__X;o__1;f__1;g__1")
                .unwrap();
            assert_eq!(ab.phylum, "p__1");
            assert_eq!(ab.colour, records.palette.ramp("p__1").unwrap()[1]);

            let cd = records
                .node_colours
                .iter()
                .find(|c| c.reference.to_string() == "C|D")
                .unwrap();
            assert_eq!(cd.phylum, "p__2");
        }
    }

    #[test]
    fn test_single_leaf_tree_has_no_collapse_groups() {
        let lineages = table(&[("A", "d__B;p__1;c__1;o__1;f__1;g__1;s__1")]);
        let (_, records, _) = build("A;", &lineages);
        for rank in TaxonRank::ALL {
            assert!(records.collapse_groups(rank).is_empty(), "{:?}", rank);
        }
    }

    #[test]
    fn test_palette_follows_phylum_lca_order() {
        // leaf A closes first in post-order, so p__2 takes the first colour
        let lineages = table(&[
            ("A", "d__B;p__2;c__2;o__2;f__2;g__2;s__2"),
            ("B", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
            ("C", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
        ]);
        let (_, records, _) = build("(A,(B,C));", &lineages);
        assert_eq!(records.palette.base("p__1"), Some(TABLEAU_20[1]));
        assert_eq!(records.palette.base("p__2"), Some(TABLEAU_20[0]));
    }

    #[test]
    fn test_collapse_groups_skip_single_genomes() {
        let lineages = table(&[
            ("A", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
            ("B", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
            ("C", "d__B;p__2;c__2;o__2;f__2;g__2;s__2"),
        ]);
        let (_, records, _) = build("((A,B),C);", &lineages);

        let phylum = records.collapse_groups(TaxonRank::Phylum);
        assert_eq!(phylum, vec![&LcaReference::Pair("A".into(), "B".into())]);
        assert!(records.collapse_groups(TaxonRank::Class).is_empty());
    }

    #[test]
    fn test_multifurcation_reports_diagnostic() {
        let lineages = table(&[
            ("A", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
            ("B", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
            ("C", "d__B;p__1;c__1;o__1;f__1;g__1;s__1"),
            ("D", "d__B;p__2;c__2;o__2;f__2;g__2;s__2"),
        ]);
        let (_, records, diagnostics) = build("((A,B,C),D);", &lineages);
        assert_eq!(records.phylum_lca["p__1"], vec![LcaReference::Pair("A".into(), "B".into())]);
        assert_eq!(diagnostics.len(), 1);
    }
}
