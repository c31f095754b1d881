use super::pipeline::{load_inputs, run_decoration};
use crate::cli::CommonArgs;
use crate::config::Config;
use crate::export::{DecorationExport, ExportInputs};
use anyhow::{Context, Result};
use std::path::Path;

pub fn run(
    tree_path: &Path,
    taxonomy_path: &Path,
    output_file: Option<&Path>,
    common: &CommonArgs,
) -> Result<()> {
    let config = Config::resolve(common.config.as_deref())?;
    let palette = config.palette_options()?;

    let inputs = load_inputs(tree_path, taxonomy_path, common.raw_ids)?;
    let decoration = run_decoration(&inputs, &palette)?;

    let export = DecorationExport::new(
        ExportInputs {
            tree: tree_path.display().to_string(),
            taxonomy: taxonomy_path.display().to_string(),
        },
        &decoration,
        &config.collapse_ranks,
    );
    let json = export.to_json().context("Failed to serialize summary")?;

    match output_file {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Summary written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
