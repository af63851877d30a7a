//! # strata-core
//!
//! Shared vocabulary for the strata crates.
//!
//! - **Messages**: [`Message`] with a [`Role`] and plain-text content. Messages are
//!   immutable once handed to the context manager; ordering is significant.
//! - **Chunk metadata**: [`ChunkMeta`], the fixed-schema record attached to every
//!   segment and long-term memory chunk, plus [`ChunkFilter`] for exact-match
//!   filtering during search.

#![deny(unsafe_code)]

pub mod messages;
pub mod meta;

pub use messages::{Message, Role};
pub use meta::{ChunkFilter, ChunkMeta};
