use super::descendants::DescendantLeaves;
use crate::error::{DecorateError, Result};
use crate::taxonomy::{Lineage, LineageTable, TaxonRank};
use crate::tree::{NodeId, Tree};
use serde::Serialize;
use std::collections::VecDeque;

/// One taxon a node is monophyletic for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TaxonLabel {
    pub rank: TaxonRank,
    pub name: String,
}

/// Per-node taxon labels, most general rank first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxLabels {
    labels: Vec<Vec<TaxonLabel>>,
}

impl TaxLabels {
    pub fn get(&self, id: NodeId) -> &[TaxonLabel] {
        &self.labels[id.index()]
    }

    pub fn is_labeled(&self, id: NodeId) -> bool {
        !self.labels[id.index()].is_empty()
    }

    /// Semicolon-joined taxon names, `None` for an unlabeled node.
    pub fn compound(&self, id: NodeId) -> Option<String> {
        let labels = self.get(id);
        if labels.is_empty() {
            return None;
        }
        Some(
            labels
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>()
                .join(";"),
        )
    }

    pub fn labeled_count(&self) -> usize {
        self.labels.iter().filter(|l| !l.is_empty()).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkItem {
    /// The node was monophyletic at the previous rank; try the next one.
    Retest(NodeId, TaxonRank),
    /// The parent was not monophyletic at this rank; test the child on its own.
    Descend(NodeId, TaxonRank),
}

impl WorkItem {
    fn target(self) -> (NodeId, TaxonRank) {
        match self {
            WorkItem::Retest(node, rank) | WorkItem::Descend(node, rank) => (node, rank),
        }
    }
}

/// Labels every node with the taxa its whole subtree agrees on.
///
/// Starting from the root at domain rank, a node that is uniform at a rank is
/// labeled and immediately retested at the next rank (front of the queue),
/// so it reaches its deepest uniform rank before anything else runs. A node
/// that is mixed hands the same rank to each child (back of the queue).
pub fn label_monophyletic_groups(
    tree: &Tree,
    descendants: &DescendantLeaves,
    lineages: &LineageTable,
) -> Result<TaxLabels> {
    let leaf_lineages = resolve_leaf_lineages(tree, descendants, lineages)?;
    let mut labels: Vec<Vec<TaxonLabel>> = vec![Vec::new(); tree.len()];

    let mut queue = VecDeque::from([WorkItem::Descend(tree.root(), TaxonRank::Domain)]);
    let mut processed = 0usize;

    while let Some(item) = queue.pop_front() {
        processed += 1;
        let (node, rank) = item.target();
        let members = &leaf_lineages[descendants.span(node)];

        match uniform_name(members, rank) {
            Some(name) => {
                labels[node.index()].push(TaxonLabel {
                    rank,
                    name: name.to_string(),
                });
                if let Some(next) = rank.next() {
                    queue.push_front(WorkItem::Retest(node, next));
                }
            }
            None => {
                tracing::trace!(node = %node, rank = %rank, ?item, "not monophyletic, descending");
                for child in tree.children(node) {
                    queue.push_back(WorkItem::Descend(*child, rank));
                }
            }
        }
    }

    let labels = TaxLabels { labels };
    tracing::debug!(
        work_items = processed,
        labeled = labels.labeled_count(),
        "assigned monophyletic taxon labels"
    );
    Ok(labels)
}

/// The single name shared by every member at `rank`, if there is exactly one.
fn uniform_name<'a>(members: &[&'a Lineage], rank: TaxonRank) -> Option<&'a str> {
    let (&first, rest) = members.split_first()?;
    let name = first.get(rank);
    rest.iter().all(|l| l.get(rank) == name).then_some(name)
}

/// Lineage of every leaf, indexed by leaf position.
pub(crate) fn resolve_leaf_lineages<'a>(
    tree: &Tree,
    descendants: &DescendantLeaves,
    lineages: &'a LineageTable,
) -> Result<Vec<&'a Lineage>> {
    (0..descendants.leaf_count())
        .map(|pos| {
            let gid = tree.node(descendants.leaf_at(pos)).genome_id().unwrap_or("");
            lineages
                .get(gid)
                .ok_or_else(|| DecorateError::MissingLineage {
                    genome: gid.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_newick;

    fn lineage(names: [&str; 7]) -> Lineage {
        Lineage::new(names.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn table(entries: &[(&str, [&str; 7])]) -> LineageTable {
        let mut table = LineageTable::new();
        for (gid, names) in entries {
            table.insert(*gid, lineage(*names));
        }
        table
    }

    fn node_by_label(tree: &Tree, label: &str) -> NodeId {
        tree.node_ids()
            .find(|id| tree.node(*id).label() == Some(label) || tree.node(*id).genome_id() == Some(label))
            .unwrap()
    }

    fn names(labels: &TaxLabels, id: NodeId) -> Vec<&str> {
        labels.get(id).iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn test_two_phyla() {
        let tree = parse_newick("((A,B)s1,(C,D)s2)root;").unwrap();
        let lineages = table(&[
            ("A", ["d__B", "p__1", "c__1", "o__1", "f__1", "g__1", "s__1a"]),
            ("B", ["d__B", "p__1", "c__1", "o__1", "f__1", "g__1", "s__1b"]),
            ("C", ["d__B", "p__2", "c__2", "o__2", "f__2", "g__2", "s__2"]),
            ("D", ["d__B", "p__2", "c__2", "o__2", "f__2", "g__2", "s__2"]),
        ]);
        let desc = DescendantLeaves::propagate(&tree);
        let labels = label_monophyletic_groups(&tree, &desc, &lineages).unwrap();

        assert_eq!(names(&labels, tree.root()), vec!["d__B"]);
        assert_eq!(
            names(&labels, node_by_label(&tree, "s1")),
            vec!["p__1", "c__1", "o__1", "f__1", "g__1"]
        );
        assert_eq!(
            names(&labels, node_by_label(&tree, "s2")),
            vec!["p__2", "c__2", "o__2", "f__2", "g__2", "s__2"]
        );
        // s1 split at species, so each leaf gets its own species
        assert_eq!(names(&labels, node_by_label(&tree, "A")), vec!["s__1a"]);
        assert_eq!(names(&labels, node_by_label(&tree, "B")), vec!["s__1b"]);
        // s2 was uniform all the way down, leaves are never reached
        assert!(!labels.is_labeled(node_by_label(&tree, "C")));
        assert_eq!(
            labels.compound(node_by_label(&tree, "s1")).unwrap(),
            "p__1;c__1;o__1;f__1;g__1"
        );
    }

    #[test]
    fn test_mixed_domain_leaves_root_unlabeled() {
        let tree = parse_newick("(A,(B,C)x);").unwrap();
        let lineages = table(&[
            ("A", ["d__Archaea", "p__a", "c__a", "o__a", "f__a", "g__a", "s__a"]),
            ("B", ["d__Bacteria", "p__b", "c__b", "o__b", "f__b", "g__b", "s__b"]),
            ("C", ["d__Bacteria", "p__c", "c__c", "o__c", "f__c", "g__c", "s__c"]),
        ]);
        let desc = DescendantLeaves::propagate(&tree);
        let labels = label_monophyletic_groups(&tree, &desc, &lineages).unwrap();

        assert!(!labels.is_labeled(tree.root()));
        assert_eq!(labels.get(node_by_label(&tree, "A")).len(), 7);
        assert_eq!(names(&labels, node_by_label(&tree, "x")), vec!["d__Bacteria"]);
        assert_eq!(labels.get(node_by_label(&tree, "B"))[0].rank, TaxonRank::Phylum);
    }

    #[test]
    fn test_missing_lineage() {
        let tree = parse_newick("(A,B);").unwrap();
        let lineages = table(&[("A", ["d__B", "p__1", "c__1", "o__1", "f__1", "g__1", "s__1"])]);
        let desc = DescendantLeaves::propagate(&tree);
        let err = label_monophyletic_groups(&tree, &desc, &lineages).unwrap_err();
        assert!(matches!(err, DecorateError::MissingLineage { genome } if genome == "B"));
    }

    #[test]
    fn test_single_leaf_gets_full_lineage() {
        let tree = parse_newick("A;").unwrap();
        let lineages = table(&[("A", ["d__B", "p__1", "c__1", "o__1", "f__1", "g__1", "s__1"])]);
        let desc = DescendantLeaves::propagate(&tree);
        let labels = label_monophyletic_groups(&tree, &desc, &lineages).unwrap();
        assert_eq!(labels.get(tree.root()).len(), 7);
    }

    #[test]
    fn test_idempotent() {
        let tree = parse_newick("(((A,B),C),(D,E));").unwrap();
        let lineages = table(&[
            ("A", ["d__B", "p__1", "c__1", "o__1", "f__1", "g__1", "s__1"]),
            ("B", ["d__B", "p__1", "c__1", "o__1", "f__1", "g__2", "s__2"]),
            ("C", ["d__B", "p__1", "c__1", "o__3", "f__3", "g__3", "s__3"]),
            ("D", ["d__B", "p__2", "c__4", "o__4", "f__4", "g__4", "s__4"]),
            ("E", ["d__B", "p__1", "c__5", "o__5", "f__5", "g__5", "s__5"]),
        ]);
        let first = {
            let desc = DescendantLeaves::propagate(&tree);
            label_monophyletic_groups(&tree, &desc, &lineages).unwrap()
        };
        let second = {
            let desc = DescendantLeaves::propagate(&tree);
            label_monophyletic_groups(&tree, &desc, &lineages).unwrap()
        };
        assert_eq!(first, second);
    }
}
