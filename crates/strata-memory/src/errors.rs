//! Memory engine error types.

use strata_embeddings::EmbeddingError;
use thiserror::Error;

/// Errors surfaced by the context manager and ingestion helpers.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Invalid construction parameter.
    #[error("invalid memory configuration: {0}")]
    Config(String),

    /// Embedder or store failure (preserves source chain).
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Result alias for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
