use super::rank::TaxonRank;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Rank-by-rank classification of one genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    taxa: [String; 7],
}

impl Lineage {
    /// Builds a lineage from exactly seven names, domain first. Returns a
    /// reason string when the shape is wrong or a name repeats.
    pub fn new(names: Vec<String>) -> Result<Self, String> {
        let taxa: [String; 7] = names
            .try_into()
            .map_err(|names: Vec<String>| format!("expected 7 ranks, found {}", names.len()))?;

        for (i, name) in taxa.iter().enumerate() {
            if taxa[..i].contains(name) {
                return Err(format!("taxon '{}' appears at more than one rank", name));
            }
        }

        Ok(Self { taxa })
    }

    /// Parses a `d__;p__;c__;o__;f__;g__;s__` string.
    pub fn parse(taxonomy: &str) -> Result<Self, String> {
        let names = taxonomy
            .split(';')
            .map(|name| name.trim().to_string())
            .collect();
        Self::new(names)
    }

    pub fn get(&self, rank: TaxonRank) -> &str {
        &self.taxa[rank.index()]
    }

    pub fn phylum(&self) -> &str {
        self.get(TaxonRank::Phylum)
    }

    pub fn species(&self) -> &str {
        self.get(TaxonRank::Species)
    }

    /// `(rank, name)` pairs from domain to species.
    pub fn iter(&self) -> impl Iterator<Item = (TaxonRank, &str)> {
        TaxonRank::ALL
            .iter()
            .map(move |rank| (*rank, self.get(*rank)))
    }

    pub fn to_taxonomy_string(&self) -> String {
        self.taxa.join(";")
    }
}

/// Genome id to lineage lookup.
#[derive(Debug, Default, Clone)]
pub struct LineageTable {
    lineages: HashMap<String, Lineage>,
}

impl LineageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a lineage, returning the previous entry for the genome if any.
    pub fn insert(&mut self, genome: impl Into<String>, lineage: Lineage) -> Option<Lineage> {
        self.lineages.insert(genome.into(), lineage)
    }

    pub fn get(&self, genome: &str) -> Option<&Lineage> {
        self.lineages.get(genome)
    }

    pub fn contains(&self, genome: &str) -> bool {
        self.lineages.contains_key(genome)
    }

    pub fn len(&self) -> usize {
        self.lineages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lineages.is_empty()
    }

    pub fn genome_ids(&self) -> impl Iterator<Item = &str> {
        self.lineages.keys().map(String::as_str)
    }

    /// Re-keys the table through `mapping` (e.g. canonical id -> tree leaf id).
    /// Entries without a mapping keep their key.
    pub fn rekey(self, mapping: &HashMap<String, String>) -> Self {
        let lineages = self
            .lineages
            .into_iter()
            .map(|(genome, lineage)| match mapping.get(&genome) {
                Some(mapped) => (mapped.clone(), lineage),
                None => (genome, lineage),
            })
            .collect();
        Self { lineages }
    }

    /// Maps every class..species name to the phylum it belongs to. A name
    /// reused under several phyla keeps the phylum of the lowest genome id.
    pub fn taxon_to_phylum(&self) -> IndexMap<String, String> {
        let mut genomes: Vec<&String> = self.lineages.keys().collect();
        genomes.sort();

        let mut out = IndexMap::new();
        for genome in genomes {
            let lineage = &self.lineages[genome];
            for (rank, name) in lineage.iter() {
                if rank > TaxonRank::Phylum {
                    out.entry(name.to_string())
                        .or_insert_with(|| lineage.phylum().to_string());
                }
            }
        }
        out
    }
}
