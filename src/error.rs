use indexmap::IndexSet;
use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, DecorateError>;

/// Fatal errors. Every variant aborts the run and names the offending ids.
#[derive(Debug, thiserror::Error)]
pub enum DecorateError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open {path} for decompression: {source}")]
    Decompress {
        path: PathBuf,
        #[source]
        source: niffler::Error,
    },

    #[error("invalid Newick at byte {position}: {message}")]
    Newick { position: usize, message: String },

    #[error("invalid taxonomy on line {line}: {reason}")]
    InvalidTaxonomy { line: usize, reason: String },

    #[error("duplicate genome id found in taxonomy: {genome}")]
    DuplicateGenome { genome: String },

    #[error("the following genome ids appear more than once among the leaves: {}", ids.join(", "))]
    DuplicateLeaf { ids: Vec<String> },

    #[error(
        "the tree and taxonomy contain different genomes ({} without lineage: [{}]; {} not in tree: [{}])",
        missing_lineage.len(),
        missing_lineage.join(", "),
        missing_leaf.len(),
        missing_leaf.join(", ")
    )]
    LineageCoverage {
        /// Leaf ids with no taxonomy entry.
        missing_lineage: Vec<String>,
        /// Taxonomy entries with no matching leaf.
        missing_leaf: Vec<String>,
    },

    #[error("no lineage found for leaf genome {genome}")]
    MissingLineage { genome: String },

    #[error("invalid colour '{value}', expected #rrggbb")]
    InvalidColour { value: String },
}

impl DecorateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DecorateError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Non-fatal findings collected during a run and reported at the end.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Diagnostic {
    /// An LCA reference was taken for a node with more than two children, so
    /// only the first two child subtrees are represented.
    DegenerateLcaReference { reference: String, children: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DegenerateLcaReference {
                reference,
                children,
            } => write!(
                f,
                "LCA reference {} is inexact: node has {} children, only the first two are used",
                reference, children
            ),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: IndexSet<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic unless an identical one was already recorded.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.insert(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Emits every collected diagnostic as a warning event.
    pub fn report(&self) {
        for diagnostic in &self.entries {
            tracing::warn!("{}", diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_deduplicate() {
        let mut diagnostics = Diagnostics::new();
        let d = Diagnostic::DegenerateLcaReference {
            reference: "A|B".to_string(),
            children: 3,
        };
        diagnostics.push(d.clone());
        diagnostics.push(d);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_duplicate_leaf_message_lists_ids() {
        let err = DecorateError::DuplicateLeaf {
            ids: vec!["G1".to_string(), "G2".to_string()],
        };
        assert!(err.to_string().ends_with("G1, G2"));
    }

    #[test]
    fn test_lineage_coverage_message_lists_ids() {
        let err = DecorateError::LineageCoverage {
            missing_lineage: vec!["G1".to_string(), "G2".to_string()],
            missing_leaf: vec!["G9".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("2 without lineage: [G1, G2]"), "{}", message);
        assert!(message.contains("1 not in tree: [G9]"), "{}", message);
    }

    #[test]
    fn test_diagnostics_keep_first_seen_order() {
        let mut diagnostics = Diagnostics::new();
        for reference in ["C|D", "A|B", "C|D"] {
            diagnostics.push(Diagnostic::DegenerateLcaReference {
                reference: reference.to_string(),
                children: 3,
            });
        }
        let references: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(references.len(), 2);
        assert!(references[0].contains("C|D"));
        assert!(references[1].contains("A|B"));
    }
}
