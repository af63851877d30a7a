//! Long-term memory: a chunk store paired with its entity index.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use strata_embeddings::{EphemeralMemoryStore, HashingEmbedder, MemoryStore, SqliteMemoryStore};
use strata_settings::{StoreBackend, StoreSettings};
use tracing::info;

use crate::entity_index::EntityIndex;
use crate::errors::Result;
use crate::segmenter::Segment;

/// Shared handle over a [`MemoryStore`] and its [`EntityIndex`].
///
/// Cloning shares both halves, so several context managers can remember
/// into and recall from the same memory. Each store call and each index
/// update is atomic on its own; a `remember` (store write, then index
/// write) is not atomic as a pair.
#[derive(Clone)]
pub struct LongTermMemory {
    store: Arc<dyn MemoryStore>,
    index: Arc<Mutex<EntityIndex>>,
}

impl std::fmt::Debug for LongTermMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LongTermMemory")
            .field("entities", &self.index.lock().len())
            .finish_non_exhaustive()
    }
}

impl LongTermMemory {
    /// Wrap an existing store with an empty entity index.
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            index: Arc::new(Mutex::new(EntityIndex::new())),
        }
    }

    /// In-process memory with `dim`-wide embeddings.
    pub fn ephemeral(dim: usize) -> Result<Self> {
        Ok(Self::new(Arc::new(EphemeralMemoryStore::with_dimensions(dim)?)))
    }

    /// `SQLite`-backed memory at `path`.
    ///
    /// The entity index lives in memory only; it is rebuilt from the stored
    /// chunk metadata so entity recall survives a restart.
    pub fn durable(path: impl AsRef<Path>, dim: usize) -> Result<Self> {
        let store = SqliteMemoryStore::open(path, HashingEmbedder::new(dim)?)?;
        let memory = Self::new(Arc::new(store));
        memory.rebuild_index()?;
        Ok(memory)
    }

    /// Pick the backend named by `settings`.
    pub fn from_settings(settings: &StoreSettings, dim: usize) -> Result<Self> {
        match settings.backend {
            StoreBackend::Ephemeral => Self::ephemeral(dim),
            StoreBackend::Durable => Self::durable(settings.resolved_db_path(), dim),
        }
    }

    /// The underlying chunk store.
    pub fn store(&self) -> &dyn MemoryStore {
        self.store.as_ref()
    }

    /// The entity index.
    pub fn index(&self) -> &Mutex<EntityIndex> {
        &self.index
    }

    /// Store `segment` and index its entities.
    pub fn remember(&self, segment: &Segment) -> Result<()> {
        self.store.add(&segment.id, &segment.text, &segment.meta)?;
        self.index
            .lock()
            .index_chunk(&segment.id, &segment.meta.entities);
        Ok(())
    }

    /// Drop every chunk and index entry.
    pub fn reset(&self) -> Result<()> {
        self.store.reset()?;
        self.index.lock().clear();
        Ok(())
    }

    fn rebuild_index(&self) -> Result<()> {
        // The durable store yields newest first; index oldest first so the newest ids
        // end up at the front of each list.
        let chunks: Vec<_> = self.store.iter_chunks()?.collect();
        let mut index = self.index.lock();
        for chunk in chunks.iter().rev() {
            index.index_chunk(&chunk.id, &chunk.meta.entities);
        }
        if !chunks.is_empty() {
            info!(chunks = chunks.len(), entities = index.len(), "entity index rebuilt");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{ChunkMeta, Role};
    use tempfile::TempDir;

    fn segment(id: &str, text: &str, entities: &[&str]) -> Segment {
        Segment {
            id: id.into(),
            text: text.into(),
            meta: ChunkMeta::conversation(Role::User)
                .with_entities(entities.iter().map(|e| (*e).to_owned()).collect()),
        }
    }

    #[test]
    fn remember_writes_store_and_index() {
        let memory = LongTermMemory::ephemeral(64).unwrap();
        memory.remember(&segment("c1", "AAPL beat", &["AAPL", "beat"])).unwrap();
        assert_eq!(memory.store().len().unwrap(), 1);
        assert_eq!(memory.index().lock().lookup("AAPL", 5), vec!["c1"]);
    }

    #[test]
    fn clones_share_state() {
        let a = LongTermMemory::ephemeral(64).unwrap();
        let b = a.clone();
        a.remember(&segment("c1", "AAPL beat", &["AAPL"])).unwrap();
        assert_eq!(b.store().len().unwrap(), 1);
        assert_eq!(b.index().lock().lookup("AAPL", 5), vec!["c1"]);
    }

    #[test]
    fn reset_clears_both() {
        let memory = LongTermMemory::ephemeral(64).unwrap();
        memory.remember(&segment("c1", "AAPL beat", &["AAPL"])).unwrap();
        memory.reset().unwrap();
        assert!(memory.store().is_empty().unwrap());
        assert!(memory.index().lock().is_empty());
    }

    #[test]
    fn zero_dim_rejected() {
        assert!(LongTermMemory::ephemeral(0).is_err());
    }

    #[test]
    fn durable_reopen_rebuilds_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mem.sqlite");
        {
            let memory = LongTermMemory::durable(&path, 64).unwrap();
            memory.remember(&segment("c1", "AAPL first", &["AAPL"])).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
            memory.remember(&segment("c2", "AAPL second", &["AAPL"])).unwrap();
        }

        let reopened = LongTermMemory::durable(&path, 64).unwrap();
        assert_eq!(reopened.store().len().unwrap(), 2);
        assert_eq!(reopened.index().lock().lookup("AAPL", 5), vec!["c2", "c1"]);
    }

    #[test]
    fn from_settings_picks_backend() {
        let dir = TempDir::new().unwrap();
        let settings = StoreSettings {
            backend: StoreBackend::Durable,
            db_path: Some(dir.path().join("nested/mem.sqlite").display().to_string()),
        };
        let memory = LongTermMemory::from_settings(&settings, 32).unwrap();
        memory.remember(&segment("c1", "text", &[])).unwrap();
        assert!(dir.path().join("nested/mem.sqlite").exists());

        let ephemeral = LongTermMemory::from_settings(&StoreSettings::default(), 32).unwrap();
        assert!(ephemeral.store().is_empty().unwrap());
    }
}
