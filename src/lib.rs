pub mod annotate;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod taxonomy;
pub mod tree;
pub mod utils;

// Re-export main API
pub use annotate::{decorate, Annotation, Decoration, PaletteOptions};
pub use error::{DecorateError, Diagnostic, Diagnostics, Result};
pub use taxonomy::{Lineage, LineageTable, TaxonRank};
pub use tree::{NodeId, Tree};
