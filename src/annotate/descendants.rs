use crate::tree::{NodeId, Tree};
use std::collections::{HashMap, HashSet};
use std::ops::Range;

/// Descendant genome ids of every node.
///
/// Leaves are numbered left to right during one post-order pass; since every
/// subtree owns a contiguous block of that numbering, a node's descendant set
/// is stored as a span into the shared leaf order instead of a copied set.
#[derive(Debug, Clone)]
pub struct DescendantLeaves {
    leaf_order: Vec<NodeId>,
    spans: Vec<Range<usize>>,
    positions: HashMap<String, usize>,
}

impl DescendantLeaves {
    pub fn propagate(tree: &Tree) -> Self {
        let mut leaf_order = Vec::new();
        let mut spans = vec![0..0; tree.len()];
        let mut positions = HashMap::new();

        for id in tree.postorder() {
            let node = tree.node(id);
            if node.is_leaf() {
                let pos = leaf_order.len();
                leaf_order.push(id);
                if let Some(gid) = node.genome_id() {
                    positions.entry(gid.to_string()).or_insert(pos);
                }
                spans[id.index()] = pos..pos + 1;
            } else {
                let first = node.children()[0];
                let last = node.children()[node.children().len() - 1];
                spans[id.index()] = spans[first.index()].start..spans[last.index()].end;
            }
        }

        tracing::debug!(leaves = leaf_order.len(), nodes = tree.len(), "propagated descendant taxa");

        Self {
            leaf_order,
            spans,
            positions,
        }
    }

    pub fn span(&self, id: NodeId) -> Range<usize> {
        self.spans[id.index()].clone()
    }

    /// Leaf nodes under `id`, left to right.
    pub fn leaves(&self, id: NodeId) -> &[NodeId] {
        &self.leaf_order[self.span(id)]
    }

    pub fn count(&self, id: NodeId) -> usize {
        self.span(id).len()
    }

    pub fn descendant_ids<'a>(&'a self, tree: &'a Tree, id: NodeId) -> impl Iterator<Item = &'a str> + 'a {
        self.leaves(id)
            .iter()
            .filter_map(move |leaf| tree.node(*leaf).genome_id())
    }

    pub fn descendant_set<'a>(&'a self, tree: &'a Tree, id: NodeId) -> HashSet<&'a str> {
        self.descendant_ids(tree, id).collect()
    }

    /// Position of a genome's leaf in the left-to-right leaf order.
    pub fn position(&self, genome_id: &str) -> Option<usize> {
        self.positions.get(genome_id).copied()
    }

    pub fn leaf_at(&self, position: usize) -> NodeId {
        self.leaf_order[position]
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_order.len()
    }

    /// True if the subtree of `id` contains every position in `lo..=hi`.
    pub fn covers(&self, id: NodeId, lo: usize, hi: usize) -> bool {
        let span = self.span(id);
        span.start <= lo && hi < span.end
    }
}
