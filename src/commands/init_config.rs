use crate::config::Config;
use anyhow::{bail, Result};

pub fn run(force: bool) -> Result<()> {
    if let Some(path) = Config::default_path() {
        if path.exists() && !force {
            bail!("{} already exists, use --force to overwrite it", path.display());
        }
    }
    let path = Config::default().save()?;
    tracing::info!("Wrote default configuration to {}", path.display());
    Ok(())
}
