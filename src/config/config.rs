use crate::annotate::palette::{PaletteOptions, Rgb, DEFAULT_SHADE_COUNT, TABLEAU_20};
use crate::export::itol::ItolOptions;
use crate::taxonomy::TaxonRank;
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base colours handed out to phyla in order, as `#rrggbb`.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,

    #[serde(default = "default_shade_count")]
    pub shade_count: usize,

    #[serde(default = "default_strip_width")]
    pub strip_width: u32,

    /// Ranks that get an iTOL collapse file.
    #[serde(default = "default_collapse_ranks")]
    pub collapse_ranks: Vec<TaxonRank>,
}

fn default_palette() -> Vec<String> {
    TABLEAU_20.iter().map(|c| c.to_hex()).collect()
}

fn default_shade_count() -> usize {
    DEFAULT_SHADE_COUNT
}

fn default_strip_width() -> u32 {
    100
}

fn default_collapse_ranks() -> Vec<TaxonRank> {
    ItolOptions::default().collapse_ranks
}

impl Default for Config {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            shade_count: default_shade_count(),
            strip_width: default_strip_width(),
            collapse_ranks: default_collapse_ranks(),
        }
    }
}

impl Config {
    /// `config.toml` in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "gtdb", "gtdb-itol-decorate")
            .map(|proj_dirs| proj_dirs.config_dir().join("config.toml"))
    }

    /// Loads the user config, falling back to defaults when there is none or
    /// it cannot be read.
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                match Self::from_path(&config_path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("ignoring {}: {:#}", config_path.display(), e),
                }
            }
        }
        Config::default()
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// `--config` if given, otherwise the user config.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::load()),
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let Some(config_path) = Self::default_path() else {
            bail!("No configuration directory available on this platform");
        };
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(config_dir) = path.parent() {
            fs::create_dir_all(config_dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn palette_options(&self) -> Result<PaletteOptions> {
        if self.shade_count == 0 {
            bail!("shade_count must be at least 1");
        }
        let base = self
            .palette
            .iter()
            .map(|hex| Rgb::from_hex(hex))
            .collect::<crate::error::Result<Vec<_>>>()?;
        Ok(PaletteOptions {
            base,
            shade_count: self.shade_count,
        })
    }

    pub fn itol_options(&self) -> ItolOptions {
        ItolOptions {
            strip_width: self.strip_width,
            collapse_ranks: self.collapse_ranks.clone(),
        }
    }
}
