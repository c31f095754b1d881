use crate::annotate::{decorate, Decoration, PaletteOptions};
use crate::taxonomy::{load_taxonomy_file, LineageTable};
use crate::tree::validation::{canonical_leaf_mapping, validate_coverage, validate_unique_leaves};
use crate::tree::{load_newick_file, Tree};
use crate::utils::progress_bar_builder::ProgressBarBuilder;
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Tree plus lineages keyed by the tree's own leaf ids.
#[derive(Debug)]
pub struct LoadedInputs {
    pub tree: Tree,
    pub lineages: LineageTable,
}

/// Reads both inputs and checks they describe exactly the same genomes.
pub fn load_inputs(tree_path: &Path, taxonomy_path: &Path, raw_ids: bool) -> Result<LoadedInputs> {
    let progress = ProgressBarBuilder::new(format!("Reading tree from {}", tree_path.display()))
        .with_tick()
        .build()?;
    let tree = load_newick_file(tree_path)
        .with_context(|| format!("Failed to load tree {}", tree_path.display()))?;
    let leaf_ids = tree.leaf_ids();
    progress.finish_and_clear();
    tracing::info!("Found {} leaf nodes in the tree", leaf_ids.len());

    validate_unique_leaves(&tree)?;
    let mapping: HashMap<String, String> = if raw_ids {
        leaf_ids.iter().map(|gid| (gid.to_string(), gid.to_string())).collect()
    } else {
        canonical_leaf_mapping(&tree)?
    };
    let limit_to: HashSet<String> = mapping.keys().cloned().collect();

    let progress = ProgressBarBuilder::new(format!("Reading taxonomy from {}", taxonomy_path.display()))
        .with_tick()
        .build()?;
    let lineages = load_taxonomy_file(taxonomy_path, &limit_to, !raw_ids)
        .with_context(|| format!("Failed to load taxonomy {}", taxonomy_path.display()))?;
    progress.finish_and_clear();
    tracing::info!("Read the taxonomy for {} genomes", lineages.len());

    validate_coverage(
        limit_to.iter().map(String::as_str),
        lineages.genome_ids(),
    )?;

    Ok(LoadedInputs {
        tree,
        lineages: lineages.rekey(&mapping),
    })
}

pub fn run_decoration(inputs: &LoadedInputs, options: &PaletteOptions) -> Result<Decoration> {
    let progress = ProgressBarBuilder::new("Annotating internal nodes with descendant taxa")
        .with_elapsed()
        .with_tick()
        .build()?;
    let decoration = decorate(&inputs.tree, &inputs.lineages, options)?;
    progress.finish_and_clear();
    decoration.diagnostics.report();
    Ok(decoration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecorateError;
    use std::fs;

    fn write_inputs(dir: &Path, tree: &str, taxonomy: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let tree_path = dir.join("tree.nwk");
        let tax_path = dir.join("tax.tsv");
        fs::write(&tree_path, tree).unwrap();
        fs::write(&tax_path, taxonomy).unwrap();
        (tree_path, tax_path)
    }

    #[test]
    fn test_canonical_ids_are_mapped_back_to_leaves() {
        let dir = tempfile::tempdir().unwrap();
        let (tree, tax) = write_inputs(
            dir.path(),
            "(GCF_000005845.2,GCA_000008865.1);",
            "RS_GCF_000005845.2\td__B;p__1;c__1;o__1;f__1;g__1;s__1\n\
             GB_GCA_000008865.1\td__B;p__2;c__2;o__2;f__2;g__2;s__2\n\
             RS_GCF_999999999.1\td__B;p__3;c__3;o__3;f__3;g__3;s__3\n",
        );
        let inputs = load_inputs(&tree, &tax, false).unwrap();
        assert_eq!(inputs.lineages.len(), 2);
        assert!(inputs.lineages.contains("GCF_000005845.2"));
        assert!(inputs.lineages.contains("GCA_000008865.1"));
    }

    #[test]
    fn test_raw_ids_require_exact_match() {
        let dir = tempfile::tempdir().unwrap();
        let (tree, tax) = write_inputs(
            dir.path(),
            "(GCF_000005845.2,B);",
            "RS_GCF_000005845.2\td__B;p__1;c__1;o__1;f__1;g__1;s__1\n\
             B\td__B;p__2;c__2;o__2;f__2;g__2;s__2\n",
        );
        let err = load_inputs(&tree, &tax, true).unwrap_err();
        match err.downcast_ref::<DecorateError>() {
            Some(DecorateError::LineageCoverage { missing_lineage, missing_leaf }) => {
                assert_eq!(missing_lineage, &vec!["GCF_000005845.2".to_string()]);
                assert!(missing_leaf.is_empty());
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_leaves_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (tree, tax) = write_inputs(dir.path(), "(A,(A,B));", "A\td__B;p__1;c__1;o__1;f__1;g__1;s__1\n");
        let err = load_inputs(&tree, &tax, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DecorateError>(),
            Some(DecorateError::DuplicateLeaf { ids }) if ids == &vec!["A".to_string()]
        ));
    }
}
