//! # strata-embeddings
//!
//! Deterministic text embeddings and the long-term memory stores built on them.
//!
//! - [`HashingEmbedder`]: SHA-256 feature hashing into a fixed-width,
//!   L2-normalized vector. No model, no network, identical output across runs.
//! - [`MemoryStore`]: the store contract. Two backends:
//!   [`EphemeralMemoryStore`] (in-process, append-only) and
//!   [`SqliteMemoryStore`] (durable, upsert by id).
//! - [`ranking`]: brute-force cosine ranking with optional MMR diversity
//!   reranking, shared by both backends.

#![deny(unsafe_code)]

pub mod embedder;
pub mod ephemeral;
pub mod errors;
pub mod normalize;
pub mod ranking;
pub mod sqlite;
pub mod store;

pub use embedder::{DEFAULT_DIMENSIONS, HashingEmbedder, tokenize};
pub use ephemeral::EphemeralMemoryStore;
pub use errors::{EmbeddingError, Result};
pub use sqlite::SqliteMemoryStore;
pub use store::{ChunkIter, MemoryChunk, MemoryStore, SearchOptions};
