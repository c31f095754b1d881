mod canonical;
mod lineage;
mod loader;
mod rank;

pub use canonical::canonical_gid;
pub use lineage::{Lineage, LineageTable};
pub use loader::{load_taxonomy_file, read_taxonomy};
pub use rank::TaxonRank;
