//! Bulk document ingestion.

use std::sync::LazyLock;

use regex::Regex;
use strata_core::ChunkMeta;
use strata_embeddings::MemoryStore;
use tracing::info;

use crate::errors::Result;
use crate::segmenter::{Segment, StreamingSegmenter};

static PARAGRAPH_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Outcome of indexing one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Number of segments stored.
    pub count: usize,
    /// Ids of the stored segments, in flush order.
    pub ids: Vec<String>,
}

/// Split on runs of blank lines; parts are trimmed and blanks dropped.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK_RE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Segment `text` paragraph by paragraph and return every completed segment,
/// including the final partial buffer.
pub(crate) fn segment_document(
    text: &str,
    meta: &ChunkMeta,
    segmenter: &mut StreamingSegmenter,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    for part in split_paragraphs(text) {
        segments.extend(segmenter.add(part, meta));
    }
    segments.extend(segmenter.flush(meta));
    segments
}

/// Segment `text` and store every segment in `store`.
///
/// Only the store is written; callers that also want entity recall should
/// go through `ContextManager::index_document`.
pub fn index_text(
    store: &dyn MemoryStore,
    text: &str,
    meta: &ChunkMeta,
    segmenter: &mut StreamingSegmenter,
) -> Result<IndexReport> {
    let mut report = IndexReport::default();
    for segment in segment_document(text, meta, segmenter) {
        store.add(&segment.id, &segment.text, &segment.meta)?;
        report.ids.push(segment.id);
    }
    report.count = report.ids.len();
    info!(
        count = report.count,
        filename = meta.filename.as_deref().unwrap_or(""),
        "document indexed"
    );
    Ok(report)
}
