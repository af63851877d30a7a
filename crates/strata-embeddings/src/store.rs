//! The long-term memory store abstraction.

use strata_core::{ChunkFilter, ChunkMeta};

use crate::errors::Result;

/// A stored piece of long-term memory.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryChunk {
    /// Unique id within the store.
    pub id: String,
    /// Segment text.
    pub text: String,
    /// Unit-length (or zero) embedding of `text`.
    pub embedding: Vec<f32>,
    /// Metadata supplied at insertion.
    pub meta: ChunkMeta,
}

/// Options for [`MemoryStore::search`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchOptions {
    /// Maximum number of results. Zero returns nothing.
    pub k: usize,
    /// Exact-match metadata filter.
    pub filter: ChunkFilter,
    /// MMR trade-off; values `<= 0` disable diversity reranking.
    pub mmr_lambda: f32,
    /// Number of top candidates considered before selection.
    /// Defaults to `max(4k, 12)`.
    pub candidate_pool: Option<usize>,
}

impl SearchOptions {
    /// Plain top-`k` search with no filter.
    pub fn top_k(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }

    /// Enable MMR reranking with the given lambda.
    #[must_use]
    pub fn with_mmr(mut self, lambda: f32) -> Self {
        self.mmr_lambda = lambda;
        self
    }

    /// Restrict the candidate pool size.
    #[must_use]
    pub fn with_candidate_pool(mut self, pool: usize) -> Self {
        self.candidate_pool = Some(pool);
        self
    }

    /// Restrict results to chunks matching `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: ChunkFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Snapshot iterator returned by [`MemoryStore::iter_chunks`].
pub type ChunkIter<'a> = Box<dyn Iterator<Item = MemoryChunk> + 'a>;

/// Embedded chunk storage with similarity search.
///
/// Every method takes `&self`; implementations serialize access internally
/// so a single call is atomic. Sequences of calls are not.
pub trait MemoryStore: Send + Sync {
    /// Embed `text` and store it under `id`.
    fn add(&self, id: &str, text: &str, meta: &ChunkMeta) -> Result<()>;

    /// Rank stored chunks against `query`.
    fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<MemoryChunk>>;

    /// Iterate over every stored chunk.
    fn iter_chunks(&self) -> Result<ChunkIter<'_>>;

    /// Number of stored chunks.
    fn len(&self) -> Result<usize>;

    /// Whether the store holds no chunks.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every stored chunk.
    fn reset(&self) -> Result<()>;
}
