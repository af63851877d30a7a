//! Durable memory store backed by a single `SQLite` table.
//!
//! Embeddings are stored as little-endian f32 BLOBs and metadata as JSON.
//! Search loads the whole table and ranks in process; there is no vector
//! index.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{Connection, params};
use strata_core::ChunkMeta;
use tracing::{info, warn};

use crate::embedder::HashingEmbedder;
use crate::errors::{EmbeddingError, Result};
use crate::normalize::{blob_to_f32_vec, f32_slice_to_blob};
use crate::ranking::rank;
use crate::store::{ChunkIter, MemoryChunk, MemoryStore, SearchOptions};

/// File name used by [`SqliteMemoryStore::open_in_dir`].
pub const DEFAULT_DB_FILE: &str = "memory.sqlite";

const PRAGMAS: &str = r"
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
";

const CREATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS memory_chunks (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    embedding BLOB NOT NULL,
    meta TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_memory_chunks_created_at ON memory_chunks(created_at);
";

/// Memory store persisted to `SQLite`.
///
/// Adding an existing id replaces the chunk and refreshes its timestamp.
/// Chunks are listed newest first. Reading a chunk whose stored embedding
/// does not match the embedder's width fails with
/// [`EmbeddingError::Storage`].
pub struct SqliteMemoryStore {
    conn: Mutex<Connection>,
    path: PathBuf,
    embedder: HashingEmbedder,
}

impl SqliteMemoryStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>, embedder: HashingEmbedder) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), dims = embedder.dimensions(), "memory store opened");
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_owned(),
            embedder,
        })
    }

    /// Open `dir/memory.sqlite`.
    pub fn open_in_dir(dir: impl AsRef<Path>, embedder: HashingEmbedder) -> Result<Self> {
        Self::open(dir.as_ref().join(DEFAULT_DB_FILE), embedder)
    }

    /// Open a private in-memory database.
    pub fn in_memory(embedder: HashingEmbedder) -> Result<Self> {
        let conn = Self::init(Connection::open_in_memory()?)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: PathBuf::from(":memory:"),
            embedder,
        })
    }

    fn init(conn: Connection) -> Result<Connection> {
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(CREATE_TABLE)?;
        Ok(conn)
    }

    /// Database location, or `:memory:`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The embedder used for chunks and queries.
    pub fn embedder(&self) -> &HashingEmbedder {
        &self.embedder
    }

    fn load_all(&self) -> Result<Vec<MemoryChunk>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, text, embedding, meta FROM memory_chunks
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let dim = self.embedder.dimensions();
        let mut chunks = Vec::new();
        for row in rows {
            let (id, text, blob, meta_json) = row?;
            chunks.push(MemoryChunk {
                meta: decode_meta(&id, &meta_json),
                embedding: decode_embedding(&id, &blob, dim)?,
                id,
                text,
            });
        }
        Ok(chunks)
    }
}

fn decode_embedding(id: &str, blob: &[u8], dim: usize) -> Result<Vec<f32>> {
    if blob.len() != dim * 4 {
        return Err(EmbeddingError::Storage(format!(
            "chunk {id}: embedding has {} bytes, expected {} for {dim} dimensions",
            blob.len(),
            dim * 4
        )));
    }
    Ok(blob_to_f32_vec(blob))
}

fn decode_meta(id: &str, raw: &str) -> ChunkMeta {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(chunk_id = id, error = %e, "malformed chunk metadata, using default");
        ChunkMeta::default()
    })
}

impl MemoryStore for SqliteMemoryStore {
    fn add(&self, id: &str, text: &str, meta: &ChunkMeta) -> Result<()> {
        let blob = f32_slice_to_blob(&self.embedder.embed(text));
        let meta_json = serde_json::to_string(meta)?;
        let now = chrono::Utc::now().timestamp_millis();
        let _ = self.conn.lock().execute(
            "INSERT OR REPLACE INTO memory_chunks (id, text, embedding, meta, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, text, blob, meta_json, now],
        )?;
        Ok(())
    }

    fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<MemoryChunk>> {
        if opts.k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed(query);
        Ok(rank(&query_vec, &self.load_all()?, opts))
    }

    fn iter_chunks(&self) -> Result<ChunkIter<'_>> {
        Ok(Box::new(self.load_all()?.into_iter()))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn len(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .lock()
                .query_row("SELECT count(*) FROM memory_chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn reset(&self) -> Result<()> {
        let _ = self.conn.lock().execute("DELETE FROM memory_chunks", [])?;
        Ok(())
    }
}
