//! Inverted index from entity tokens to the chunks that mention them.

use std::collections::{HashMap, VecDeque};

/// Entity → chunk ids, most recent first.
///
/// Lists grow without bound unless a per-entity cap is set with
/// [`EntityIndex::with_max_ids_per_entity`]; with a cap, the oldest ids fall
/// off the back.
#[derive(Clone, Debug, Default)]
pub struct EntityIndex {
    entries: HashMap<String, VecDeque<String>>,
    max_ids_per_entity: Option<usize>,
}

impl EntityIndex {
    /// Create an empty, unbounded index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `n` ids per entity.
    #[must_use]
    pub fn with_max_ids_per_entity(mut self, n: usize) -> Self {
        self.max_ids_per_entity = Some(n);
        self
    }

    /// Record that `chunk_id` mentions `entity`.
    pub fn insert(&mut self, entity: &str, chunk_id: &str) {
        let ids = self.entries.entry(entity.to_owned()).or_default();
        ids.push_front(chunk_id.to_owned());
        if let Some(cap) = self.max_ids_per_entity {
            ids.truncate(cap);
        }
    }

    /// Record every entity of one chunk.
    pub fn index_chunk(&mut self, chunk_id: &str, entities: &[String]) {
        for entity in entities {
            self.insert(entity, chunk_id);
        }
    }

    /// Up to `limit` ids for `entity`, most recent first.
    pub fn lookup(&self, entity: &str, limit: usize) -> Vec<String> {
        self.entries
            .get(entity)
            .map(|ids| ids.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Number of distinct entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entity has been indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. The cap is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
