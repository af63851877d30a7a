//! In-process memory store.

use parking_lot::RwLock;
use strata_core::ChunkMeta;

use crate::embedder::HashingEmbedder;
use crate::errors::Result;
use crate::ranking::rank;
use crate::store::{ChunkIter, MemoryChunk, MemoryStore, SearchOptions};

/// Append-only store held in memory for the lifetime of the process.
///
/// Adding an id twice keeps both chunks.
#[derive(Debug)]
pub struct EphemeralMemoryStore {
    embedder: HashingEmbedder,
    chunks: RwLock<Vec<MemoryChunk>>,
}

impl EphemeralMemoryStore {
    /// Create an empty store embedding with `embedder`.
    pub fn new(embedder: HashingEmbedder) -> Self {
        Self {
            embedder,
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Create an empty store with a `dim`-wide embedder.
    pub fn with_dimensions(dim: usize) -> Result<Self> {
        Ok(Self::new(HashingEmbedder::new(dim)?))
    }

    /// The embedder used for chunks and queries.
    pub fn embedder(&self) -> &HashingEmbedder {
        &self.embedder
    }
}

impl Default for EphemeralMemoryStore {
    fn default() -> Self {
        Self::new(HashingEmbedder::default())
    }
}

impl MemoryStore for EphemeralMemoryStore {
    fn add(&self, id: &str, text: &str, meta: &ChunkMeta) -> Result<()> {
        let chunk = MemoryChunk {
            id: id.to_owned(),
            text: text.to_owned(),
            embedding: self.embedder.embed(text),
            meta: meta.clone(),
        };
        self.chunks.write().push(chunk);
        Ok(())
    }

    fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<MemoryChunk>> {
        if opts.k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed(query);
        let chunks = self.chunks.read();
        Ok(rank(&query_vec, chunks.iter(), opts))
    }

    // A snapshot, so no read guard outlives the call.
    fn iter_chunks(&self) -> Result<ChunkIter<'_>> {
        let snapshot = self.chunks.read().clone();
        Ok(Box::new(snapshot.into_iter()))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.chunks.read().len())
    }

    fn reset(&self) -> Result<()> {
        self.chunks.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{ChunkFilter, Role};

    fn store() -> EphemeralMemoryStore {
        EphemeralMemoryStore::default()
    }

    #[test]
    fn add_and_len() {
        let s = store();
        assert!(s.is_empty().unwrap());
        s.add("c1", "rust ownership", &ChunkMeta::default()).unwrap();
        assert_eq!(s.len().unwrap(), 1);
    }

    #[test]
    fn duplicate_ids_coexist() {
        let s = store();
        s.add("c1", "first", &ChunkMeta::default()).unwrap();
        s.add("c1", "second", &ChunkMeta::default()).unwrap();
        assert_eq!(s.len().unwrap(), 2);
    }

    #[test]
    fn iter_in_append_order_and_restartable() {
        let s = store();
        for (id, text) in [("a", "one"), ("b", "two"), ("c", "three")] {
            s.add(id, text, &ChunkMeta::default()).unwrap();
        }
        let first: Vec<String> = s.iter_chunks().unwrap().map(|c| c.id).collect();
        let second: Vec<String> = s.iter_chunks().unwrap().map(|c| c.id).collect();
        assert_eq!(first, vec!["a", "b", "c"]);
        assert_eq!(first, second);
    }

    #[test]
    fn search_finds_matching_text() {
        let s = store();
        s.add("apple", "apple quarterly earnings", &ChunkMeta::default()).unwrap();
        s.add("pasta", "tomato basil pasta", &ChunkMeta::default()).unwrap();
        let hits = s.search("apple earnings", &SearchOptions::top_k(1)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "apple");
    }

    #[test]
    fn search_zero_k_empty() {
        let s = store();
        s.add("a", "apple", &ChunkMeta::default()).unwrap();
        assert!(s.search("apple", &SearchOptions::top_k(0)).unwrap().is_empty());
    }

    #[test]
    fn search_unrelated_query_empty() {
        let s = store();
        s.add("a", "apple", &ChunkMeta::default()).unwrap();
        assert!(s.search("", &SearchOptions::top_k(3)).unwrap().is_empty());
    }

    #[test]
    fn search_respects_role_filter() {
        let s = store();
        s.add("u", "apple earnings", &ChunkMeta::conversation(Role::User)).unwrap();
        s.add("a", "apple earnings", &ChunkMeta::conversation(Role::Assistant))
            .unwrap();
        let opts = SearchOptions::top_k(5).with_filter(ChunkFilter {
            role: Some(Role::Assistant),
            ..ChunkFilter::default()
        });
        let hits = s.search("apple", &opts).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn reset_drops_everything() {
        let s = store();
        s.add("a", "apple", &ChunkMeta::default()).unwrap();
        s.reset().unwrap();
        assert_eq!(s.len().unwrap(), 0);
        assert_eq!(s.iter_chunks().unwrap().count(), 0);
    }

    #[test]
    fn stored_embedding_has_store_width() {
        let s = EphemeralMemoryStore::with_dimensions(32).unwrap();
        s.add("a", "apple", &ChunkMeta::default()).unwrap();
        let chunk = s.iter_chunks().unwrap().next().unwrap();
        assert_eq!(chunk.embedding.len(), 32);
        assert_eq!(s.embedder().dimensions(), 32);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(EphemeralMemoryStore::with_dimensions(0).is_err());
    }
}
