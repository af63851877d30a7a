//! Streaming topic segmentation.
//!
//! [`StreamingSegmenter`] buffers incoming text fragments and emits a
//! [`Segment`] whenever the buffer looks complete: the topic shifts, the
//! buffer grows too long or spans too many fragments, a definitional
//! statement appears, or a sentence ends.

use strata_core::ChunkMeta;
use strata_embeddings::HashingEmbedder;
use strata_embeddings::normalize::cosine_similarity;
use strata_settings::SegmenterSettings;
use tracing::debug;
use uuid::Uuid;

use crate::constants::{
    DEFINITION_MARKERS, DEFINITION_MIN_CHARS, SENTENCE_TERMINALS, TURN_FLUSH_MIN_CHARS,
};
use crate::entities::extract_entities;

/// A completed span of related text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Unique id (UUIDv7, simple form).
    pub id: String,
    /// Trimmed text, fragments joined with `\n`.
    pub text: String,
    /// Caller metadata with `entities` filled from `text`.
    pub meta: ChunkMeta,
}

/// Segmentation thresholds. Lengths are in characters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmenterConfig {
    /// Buffer length below which topic shifts and sentence ends are ignored.
    pub min_chars: usize,
    /// Buffer length that forces a flush.
    pub max_chars: usize,
    /// Cosine between buffer and fragment below which the buffer is flushed first.
    pub boundary_similarity: f32,
    /// Fragment count that forces a flush. Values below 2 act as 2.
    pub max_turns: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_chars: 40,
            max_chars: 560,
            boundary_similarity: 0.35,
            max_turns: 4,
        }
    }
}

impl SegmenterConfig {
    /// Thresholds for evicted conversation turns.
    ///
    /// Any sentence-final turn closes its segment, so short turns such as
    /// `"A。"` are still remembered on their own.
    pub fn conversation() -> Self {
        Self {
            min_chars: 1,
            ..Self::default()
        }
    }

    /// Thresholds for bulk document ingestion.
    pub fn document() -> Self {
        Self {
            min_chars: 80,
            max_chars: 760,
            boundary_similarity: 0.25,
            max_turns: 12,
        }
    }

    /// Build from the settings layer.
    pub fn from_settings(settings: &SegmenterSettings) -> Self {
        Self {
            min_chars: settings.min_chars,
            max_chars: settings.max_chars,
            boundary_similarity: settings.boundary_similarity,
            max_turns: settings.max_turns,
        }
    }
}

/// Incremental segmenter over a stream of text fragments.
#[derive(Clone, Debug)]
pub struct StreamingSegmenter {
    embedder: HashingEmbedder,
    min_chars: usize,
    max_chars: usize,
    boundary_similarity: f32,
    max_turns: usize,
    buffer: Vec<String>,
    buffer_embedding: Option<Vec<f32>>,
}

impl StreamingSegmenter {
    /// Create a segmenter using `embedder` for topic similarity.
    pub fn new(config: SegmenterConfig, embedder: HashingEmbedder) -> Self {
        Self {
            embedder,
            min_chars: config.min_chars,
            max_chars: config.max_chars,
            boundary_similarity: config.boundary_similarity,
            max_turns: config.max_turns.max(2),
            buffer: Vec::new(),
            buffer_embedding: None,
        }
    }

    /// Feed one fragment; returns the segments it completed (zero, one or two).
    pub fn add(&mut self, fragment: &str, meta: &ChunkMeta) -> Vec<Segment> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Vec::new();
        }

        let fragment_embedding = self.embedder.embed(fragment);
        let mut out = Vec::new();

        let boundary_sim = match &self.buffer_embedding {
            Some(buffered) if self.buffered_chars() >= self.min_chars => {
                Some(cosine_similarity(buffered, &fragment_embedding))
            }
            _ => None,
        };
        if let Some(sim) = boundary_sim.filter(|sim| *sim < self.boundary_similarity) {
            debug!(sim, threshold = self.boundary_similarity, "topic boundary");
            out.extend(self.flush(meta));
        }

        self.buffer.push(fragment.to_owned());
        let merged = self.merged();
        self.buffer_embedding = Some(self.embedder.embed(&merged));
        let merged_chars = merged.chars().count();

        if merged_chars >= self.max_chars {
            out.extend(self.flush(meta));
        }

        if self.buffer.len() >= self.max_turns
            && merged_chars >= TURN_FLUSH_MIN_CHARS.max(self.min_chars / 2)
        {
            out.extend(self.flush(meta));
        }

        if merged_chars >= DEFINITION_MIN_CHARS
            && DEFINITION_MARKERS.iter().any(|m| merged.contains(*m))
        {
            out.extend(self.flush(meta));
        }

        if merged.ends_with(SENTENCE_TERMINALS) && merged_chars >= self.min_chars {
            out.extend(self.flush(meta));
        }

        out
    }

    /// Emit whatever is buffered as one segment.
    ///
    /// Returns `None` when the buffer is blank. The buffer is cleared either way.
    pub fn flush(&mut self, meta: &ChunkMeta) -> Option<Segment> {
        let text = self.merged().trim().to_owned();
        self.reset();
        if text.is_empty() {
            return None;
        }

        let segment = Segment {
            id: Uuid::now_v7().simple().to_string(),
            meta: meta.with_entities(extract_entities(&text)),
            text,
        };
        debug!(segment_id = %segment.id, chars = segment.text.chars().count(), "segment flushed");
        Some(segment)
    }

    /// Discard any partial buffer.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.buffer_embedding = None;
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Length of the buffered text in characters.
    pub fn buffered_chars(&self) -> usize {
        self.merged().chars().count()
    }

    fn merged(&self) -> String {
        self.buffer.join("\n")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
