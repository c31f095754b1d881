pub mod newick;
pub mod validation;

pub use newick::{load_newick_file, parse_label, parse_newick, support_token, write_newick, LabelStyle, NodeLabel};

use std::fmt;

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Genome id, set on leaves only.
    pub(crate) genome_id: Option<String>,
    /// Raw internal label as read from the tree file (support and/or taxon).
    pub(crate) label: Option<String>,
    pub(crate) edge_length: Option<f64>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn genome_id(&self) -> Option<&str> {
        self.genome_id.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn edge_length(&self) -> Option<f64> {
        self.edge_length
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Rooted tree stored as an arena. The root is always node 0 and the
/// structure is fixed once built; annotations live in side tables keyed by
/// `NodeId`.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// A tree whose root is an internal node with no children yet.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// A tree made of one leaf.
    pub fn single_leaf(genome_id: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                genome_id: Some(genome_id.into()),
                ..Node::default()
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add_internal(&mut self, parent: NodeId) -> NodeId {
        self.push(parent, Node::default())
    }

    pub fn add_leaf(&mut self, parent: NodeId, genome_id: impl Into<String>) -> NodeId {
        self.push(
            parent,
            Node {
                genome_id: Some(genome_id.into()),
                ..Node::default()
            },
        )
    }

    fn push(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].is_leaf()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Parents before children, children in their stored order.
    pub fn preorder(&self) -> Vec<NodeId> {
        self.preorder_from(self.root())
    }

    pub fn preorder_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Children before parents, children in their stored order.
    pub fn postorder(&self) -> Vec<NodeId> {
        // Reverse of a pre-order that visits children right to left.
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().copied());
        }
        out.reverse();
        out
    }

    /// Leaves in left-to-right order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|id| self.is_leaf(*id))
            .collect()
    }

    pub fn leaf_ids(&self) -> Vec<&str> {
        self.leaves()
            .into_iter()
            .filter_map(|id| self.node(id).genome_id())
            .collect()
    }

    /// Leftmost leaf of the subtree rooted at `id`.
    pub fn first_leaf(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(first) = self.children(current).first() {
            current = *first;
        }
        current
    }

    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            out.push(parent);
            current = parent;
        }
        out
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
