use super::Tree;
use crate::error::{DecorateError, Result};
use crate::taxonomy::canonical_gid;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Fails with `DuplicateLeaf` if any genome id labels more than one leaf.
pub fn validate_unique_leaves(tree: &Tree) -> Result<()> {
    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    for gid in tree.leaf_ids() {
        if !seen.insert(gid) {
            duplicates.insert(gid.to_string());
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(DecorateError::DuplicateLeaf {
            ids: duplicates.into_iter().collect(),
        })
    }
}

/// Maps each leaf's canonical genome id back to the id used in the tree.
/// Two leaves collapsing onto one canonical id is a `DuplicateLeaf`.
pub fn canonical_leaf_mapping(tree: &Tree) -> Result<HashMap<String, String>> {
    let mut out: HashMap<String, String> = HashMap::new();
    let mut duplicates = BTreeSet::new();
    for gid in tree.leaf_ids() {
        let canonical = canonical_gid(gid);
        if out.contains_key(&canonical) {
            duplicates.insert(canonical);
        } else {
            out.insert(canonical, gid.to_string());
        }
    }

    if duplicates.is_empty() {
        Ok(out)
    } else {
        Err(DecorateError::DuplicateLeaf {
            ids: duplicates.into_iter().collect(),
        })
    }
}

/// Requires the leaf id set and the lineage key set to be identical,
/// reporting the full symmetric difference otherwise.
pub fn validate_coverage<'a>(
    leaf_ids: impl IntoIterator<Item = &'a str>,
    lineage_ids: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let leaves: BTreeSet<&str> = leaf_ids.into_iter().collect();
    let lineages: BTreeSet<&str> = lineage_ids.into_iter().collect();

    let missing_lineage: Vec<String> = leaves
        .difference(&lineages)
        .map(|s| s.to_string())
        .collect();
    let missing_leaf: Vec<String> = lineages
        .difference(&leaves)
        .map(|s| s.to_string())
        .collect();

    if missing_lineage.is_empty() && missing_leaf.is_empty() {
        return Ok(());
    }

    for gid in &missing_lineage {
        tracing::error!(genome = %gid, "genome is in the tree but not in the taxonomy");
    }
    for gid in &missing_leaf {
        tracing::error!(genome = %gid, "genome is in the taxonomy but not in the tree");
    }

    Err(DecorateError::LineageCoverage {
        missing_lineage,
        missing_leaf,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_newick;

    #[test]
    fn test_duplicate_leaves_are_enumerated() {
        let tree = parse_newick("((A,B),(A,C),B);").unwrap();
        let err = validate_unique_leaves(&tree).unwrap_err();
        match err {
            DecorateError::DuplicateLeaf { ids } => assert_eq!(ids, vec!["A", "B"]),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_canonical_collision() {
        let tree = parse_newick("(RS_GCF_000005845.2,GCF_000005845.1,GB_GCA_000009045.1);").unwrap();
        let err = canonical_leaf_mapping(&tree).unwrap_err();
        assert!(matches!(err, DecorateError::DuplicateLeaf { ids } if ids == vec!["G000005845"]));

        let tree = parse_newick("(RS_GCF_000005845.2,GB_GCA_000009045.1);").unwrap();
        let mapping = canonical_leaf_mapping(&tree).unwrap();
        assert_eq!(mapping["G000009045"], "GB_GCA_000009045.1");
    }

    #[test]
    fn test_coverage_symmetric_difference() {
        assert!(validate_coverage(["A", "B"], ["B", "A"]).is_ok());

        let err = validate_coverage(["A", "B", "C"], ["B", "D"]).unwrap_err();
        match err {
            DecorateError::LineageCoverage {
                missing_lineage,
                missing_leaf,
            } => {
                assert_eq!(missing_lineage, vec!["A", "C"]);
                assert_eq!(missing_leaf, vec!["D"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
