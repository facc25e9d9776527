use thiserror::Error;

/// Errors raised by the retrieval engine.
///
/// An empty index is not an error: searches against it return no candidates.
#[derive(Error, Debug)]
pub enum FactCheckError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Corrupt index snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FactCheckError>;
