//! Embedding and storage error types.

use thiserror::Error;

/// Errors from embedder construction and memory-store operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Invalid construction parameter.
    #[error("Config error: {0}")]
    Config(String),

    /// `SQLite` error (preserves source chain).
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored data cannot be used, such as an embedding of the wrong width.
    #[error("Storage failed: {0}")]
    Storage(String),

    /// Metadata could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while preparing the database path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;
