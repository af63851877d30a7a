//! # strata-memory
//!
//! Tiered conversational memory.
//!
//! A [`ContextManager`] keeps the first few messages pinned (the sink), a
//! FIFO window of recent turns, and a small ring of compressed system
//! context. Turns that fall out of the window are merged into topical
//! segments by the [`StreamingSegmenter`], embedded into a long-term
//! [`MemoryStore`](strata_embeddings::MemoryStore), and indexed by entity.
//!
//! Each turn, [`ContextManager::get_augmented_context`] recalls relevant
//! memory (entity hits first, then MMR-diversified similarity) and
//! assembles a prompt that fits an optional token ceiling.
//!
//! # Sharing
//!
//! [`LongTermMemory`] is cheap to clone and may back many managers.
//! Individual store and index calls are atomic; sequences of them are not,
//! so processes sharing one durable file must coordinate writes themselves.

#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod context_manager;
pub mod entities;
pub mod entity_index;
pub mod errors;
pub mod indexer;
pub mod long_term;
pub mod segmenter;
pub mod summarizer;

pub use config::ContextManagerConfig;
pub use context_manager::ContextManager;
pub use entities::extract_entities;
pub use entity_index::EntityIndex;
pub use errors::{MemoryError, Result};
pub use indexer::{IndexReport, index_text, split_paragraphs};
pub use long_term::LongTermMemory;
pub use segmenter::{Segment, SegmenterConfig, StreamingSegmenter};
pub use summarizer::{Summarizer, SummarizerError, summarize_system_context};
