use super::pipeline::{load_inputs, run_decoration};
use crate::cli::CommonArgs;
use crate::config::Config;
use crate::export::itol::write_itol_files;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run(tree_path: &Path, taxonomy_path: &Path, out_dir: &Path, common: &CommonArgs) -> Result<()> {
    let config = Config::resolve(common.config.as_deref())?;
    let palette = config.palette_options()?;

    tracing::info!("Creating output directory: {}", out_dir.display());
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let inputs = load_inputs(tree_path, taxonomy_path, common.raw_ids)?;
    let decoration = run_decoration(&inputs, &palette)?;

    let tree_name = tree_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tree".to_string());
    let written = write_itol_files(
        out_dir,
        &tree_name,
        &inputs.tree,
        &inputs.lineages,
        &decoration,
        &config.itol_options(),
    )?;

    tracing::info!("Wrote {} files to {}", written.len(), out_dir.display());
    Ok(())
}
