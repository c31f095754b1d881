use serde::{Deserialize, Serialize};
use std::fmt;

/// GTDB ranks, ordered from most general to most specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonRank {
    Domain,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl TaxonRank {
    pub const ALL: [TaxonRank; 7] = [
        TaxonRank::Domain,
        TaxonRank::Phylum,
        TaxonRank::Class,
        TaxonRank::Order,
        TaxonRank::Family,
        TaxonRank::Genus,
        TaxonRank::Species,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The next more specific rank, `None` after species.
    pub fn next(self) -> Option<TaxonRank> {
        TaxonRank::ALL.get(self.index() + 1).copied()
    }

    pub fn prefix(self) -> &'static str {
        match self {
            TaxonRank::Domain => "d__",
            TaxonRank::Phylum => "p__",
            TaxonRank::Class => "c__",
            TaxonRank::Order => "o__",
            TaxonRank::Family => "f__",
            TaxonRank::Genus => "g__",
            TaxonRank::Species => "s__",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TaxonRank::Domain => "domain",
            TaxonRank::Phylum => "phylum",
            TaxonRank::Class => "class",
            TaxonRank::Order => "order",
            TaxonRank::Family => "family",
            TaxonRank::Genus => "genus",
            TaxonRank::Species => "species",
        }
    }
}

impl fmt::Display for TaxonRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
