//! Error types for shredder-index.

use std::path::PathBuf;

/// Errors raised while extracting chunks or building and querying the index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading source files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error (permission denied, symlink loop, ...).
    #[error("walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// The walk root does not exist or is not a directory.
    #[error("not a directory: {}", .0.display())]
    RootNotFound(PathBuf),

    /// Structured source could not be parsed.
    #[error("parse failed: {0}")]
    Parse(String),

    /// No grammar compiled in for a structured file.
    #[error("unsupported language")]
    UnsupportedLanguage,

    /// An index entry carries a zero-length vector.
    #[error("entry {position} has an empty embedding")]
    EmptyEmbedding { position: usize },

    /// Index entries disagree on dimensionality.
    #[error("entry {position} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        position: usize,
        expected: usize,
        found: usize,
    },

    /// Query vector dimensionality differs from the index.
    #[error("query has dimension {found}, index expects {expected}")]
    QueryDimensionMismatch { expected: usize, found: usize },

    /// Query against an index with zero entries.
    #[error("index is empty")]
    EmptyIndex,
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
