use super::descendants::DescendantLeaves;
use super::monophyly::resolve_leaf_lineages;
use crate::error::{Diagnostic, Diagnostics, Result};
use crate::taxonomy::{LineageTable, TaxonRank};
use crate::tree::{NodeId, Tree};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Stable textual handle on a tree node, as understood by tree viewers:
/// a leaf id, or two leaves whose MRCA is the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LcaReference {
    Leaf(String),
    Pair(String, String),
}

impl LcaReference {
    /// Pair references span more than one genome.
    pub fn is_pair(&self) -> bool {
        matches!(self, LcaReference::Pair(..))
    }
}

impl fmt::Display for LcaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LcaReference::Leaf(id) => f.write_str(id),
            LcaReference::Pair(left, right) => write!(f, "{}|{}", left, right),
        }
    }
}

impl Serialize for LcaReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn leaf_name(tree: &Tree, id: NodeId) -> String {
    tree.node(tree.first_leaf(id))
        .genome_id()
        .unwrap_or_default()
        .to_string()
}

/// Builds the reference for `id`. Only the first two children are used, so
/// nodes with more children get a `DegenerateLcaReference` diagnostic.
pub fn lca_reference(tree: &Tree, id: NodeId, diagnostics: &mut Diagnostics) -> LcaReference {
    let children = tree.children(id);
    match children.len() {
        0 => LcaReference::Leaf(tree.node(id).genome_id().unwrap_or_default().to_string()),
        1 => LcaReference::Leaf(leaf_name(tree, children[0])),
        n => {
            let reference = LcaReference::Pair(leaf_name(tree, children[0]), leaf_name(tree, children[1]));
            if n > 2 {
                diagnostics.push(Diagnostic::DegenerateLcaReference {
                    reference: reference.to_string(),
                    children: n,
                });
            }
            reference
        }
    }
}

/// MRCA of one taxon's genomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonLca {
    pub rank: TaxonRank,
    pub node: NodeId,
    pub genomes: usize,
}

pub type TaxonLcaMap = IndexMap<String, TaxonLca>;

/// Lowest node whose subtree holds every leaf position in `lo..=hi`.
pub fn mrca_of_positions(tree: &Tree, descendants: &DescendantLeaves, lo: usize, hi: usize) -> NodeId {
    let mut node = descendants.leaf_at(lo);
    while !descendants.covers(node, lo, hi) {
        match tree.parent(node) {
            Some(parent) => node = parent,
            None => break,
        }
    }
    node
}

/// Finds the MRCA of every taxon at every rank, in first-seen order (leaves
/// left to right, ranks domain to species). Taxa whose MRCA is the root are
/// left out: they span the whole tree and cannot be decorated.
pub fn taxon_lcas(
    tree: &Tree,
    descendants: &DescendantLeaves,
    lineages: &LineageTable,
) -> Result<TaxonLcaMap> {
    struct Extent {
        rank: TaxonRank,
        lo: usize,
        hi: usize,
        genomes: usize,
    }

    let leaf_lineages = resolve_leaf_lineages(tree, descendants, lineages)?;
    let mut extents: IndexMap<&str, Extent> = IndexMap::new();
    for (pos, lineage) in leaf_lineages.iter().enumerate() {
        for (rank, name) in lineage.iter() {
            extents
                .entry(name)
                .and_modify(|e| {
                    e.hi = pos;
                    e.genomes += 1;
                })
                .or_insert(Extent {
                    rank,
                    lo: pos,
                    hi: pos,
                    genomes: 1,
                });
        }
    }

    let mut out = TaxonLcaMap::new();
    let mut excluded = 0usize;
    for (name, extent) in extents {
        let node = mrca_of_positions(tree, descendants, extent.lo, extent.hi);
        if tree.parent(node).is_none() {
            excluded += 1;
            continue;
        }
        out.insert(
            name.to_string(),
            TaxonLca {
                rank: extent.rank,
                node,
                genomes: extent.genomes,
            },
        );
    }

    tracing::debug!(taxa = out.len(), excluded, "computed taxon LCAs");
    Ok(out)
}
