//! Tiered conversation context.
//!
//! [`ContextManager`] keeps four tiers:
//!
//! - **sink**: the first `sink_turns` messages, pinned forever
//! - **system**: compressed system context, a ring of `system_max` entries
//! - **recent**: a FIFO window of `l1_max_turns` messages
//! - **long-term**: everything evicted from `recent`, segmented, embedded and
//!   entity-indexed in a [`LongTermMemory`]
//!
//! Per turn, [`ContextManager::get_augmented_context`] assembles
//! `sink ++ system ++ retrieved ++ recent`, optionally budgeted to a token
//! ceiling.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use strata_core::{ChunkMeta, Message, Role};
use strata_embeddings::{HashingEmbedder, MemoryChunk, SearchOptions};
use strata_tokens::{BudgetOptions, budget_messages, estimate_tokens};
use tracing::{debug, info, warn};

use crate::config::ContextManagerConfig;
use crate::constants::{
    AUGMENT_KEEP_LAST_N, AUGMENT_MAX_SINGLE_MESSAGE_TOKENS, MIN_ENTITY_CANDIDATE_POOL,
    RETRIEVAL_OVERHEAD_TOKENS, TOKENS_PER_RETRIEVED_ITEM,
};
use crate::entities::extract_entities;
use crate::errors::Result;
use crate::indexer::{IndexReport, segment_document};
use crate::long_term::LongTermMemory;
use crate::segmenter::{Segment, SegmenterConfig, StreamingSegmenter};
use crate::summarizer::{Summarizer, summarize_system_context};

/// Per-conversation context state over a (possibly shared) long-term memory.
///
/// One manager per conversation; mutating calls take `&mut self`. Share the
/// [`LongTermMemory`] across conversations, never the manager.
pub struct ContextManager {
    config: ContextManagerConfig,
    embedder: HashingEmbedder,
    sink: Vec<Message>,
    system: VecDeque<Message>,
    recent: VecDeque<Message>,
    segmenter: StreamingSegmenter,
    pending_role: Option<Role>,
    unstored: VecDeque<Segment>,
    long_term: LongTermMemory,
    private_memory: bool,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("config", &self.config)
            .field("sink", &self.sink.len())
            .field("system", &self.system.len())
            .field("recent", &self.recent.len())
            .field("unstored", &self.unstored.len())
            .field("private_memory", &self.private_memory)
            .finish_non_exhaustive()
    }
}

impl ContextManager {
    /// Create a manager with its own in-process long-term memory.
    pub fn new(config: ContextManagerConfig) -> Result<Self> {
        config.validate()?;
        let long_term = LongTermMemory::ephemeral(config.embedding_dim)?;
        Self::build(config, long_term, true)
    }

    /// Create a manager over a shared long-term memory.
    ///
    /// [`clear`](Self::clear) only resets shared memory when asked to.
    pub fn with_long_term(config: ContextManagerConfig, long_term: LongTermMemory) -> Result<Self> {
        config.validate()?;
        Self::build(config, long_term, false)
    }

    fn build(
        config: ContextManagerConfig,
        long_term: LongTermMemory,
        private_memory: bool,
    ) -> Result<Self> {
        let embedder = HashingEmbedder::new(config.embedding_dim)?;
        Ok(Self {
            segmenter: StreamingSegmenter::new(config.segmenter, embedder),
            embedder,
            sink: Vec::with_capacity(config.sink_turns),
            system: VecDeque::with_capacity(config.system_max),
            recent: VecDeque::with_capacity(config.l1_max_turns + 1),
            pending_role: None,
            unstored: VecDeque::new(),
            long_term,
            private_memory,
            summarizer: None,
            config,
        })
    }

    /// Compress system context through `summarizer`.
    #[must_use]
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Ingestion
    // ─────────────────────────────────────────────────────────────────────

    /// Append one message; overflow from `recent` moves to long-term memory.
    ///
    /// A store failure is returned as is. Segments that could not be written
    /// stay queued and are retried by the next eviction or
    /// [`flush_pending`](Self::flush_pending).
    pub fn append(&mut self, message: Message) -> Result<()> {
        if self.sink.len() < self.config.sink_turns {
            self.sink.push(message);
            return Ok(());
        }

        self.recent.push_back(message);
        while self.recent.len() > self.config.l1_max_turns {
            if let Some(evicted) = self.recent.pop_front() {
                self.evict(&evicted)?;
            }
        }
        Ok(())
    }

    /// Append a user message.
    pub fn add_user_input(&mut self, text: &str) -> Result<()> {
        self.append(Message::user(text))
    }

    /// Append an assistant message.
    pub fn add_assistant_output(&mut self, text: &str) -> Result<()> {
        self.append(Message::assistant(text))
    }

    /// Compress `text` and push it onto the system ring. Blank text is ignored.
    pub fn add_system_context(&mut self, text: &str) {
        let compressed = summarize_system_context(
            self.summarizer.as_deref(),
            text,
            self.config.system_context_chars,
        );
        if compressed.is_empty() {
            return;
        }
        if self.system.len() >= self.config.system_max {
            let _ = self.system.pop_front();
        }
        self.system.push_back(Message::system(compressed));
    }

    /// Force the segmenter's partial buffer into long-term memory.
    ///
    /// Returns the number of chunks written, counting segments left over from
    /// an earlier failed write.
    pub fn flush_pending(&mut self) -> Result<usize> {
        let partial = self
            .pending_role
            .take()
            .and_then(|role| self.segmenter.flush(&ChunkMeta::conversation(role)));
        self.store_segments(partial)
    }

    /// Segment a document and add it to long-term memory, entity index included.
    pub fn index_document(&self, text: &str, meta: &ChunkMeta) -> Result<IndexReport> {
        let mut segmenter = StreamingSegmenter::new(SegmenterConfig::document(), self.embedder);
        let mut report = IndexReport::default();
        for segment in segment_document(text, meta, &mut segmenter) {
            self.long_term.remember(&segment)?;
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

    fn evict(&mut self, message: &Message) -> Result<()> {
        debug!(role = %message.role, chars = message.content.chars().count(), "evicting message");
        let meta = ChunkMeta::conversation(message.role);
        let segments = self.segmenter.add(&message.content, &meta);
        self.pending_role = (!self.segmenter.is_empty()).then_some(message.role);
        let _ = self.store_segments(segments)?;
        Ok(())
    }

    /// Queue `segments` behind any unwritten ones and write the queue in order.
    fn store_segments(&mut self, segments: impl IntoIterator<Item = Segment>) -> Result<usize> {
        self.unstored.extend(segments);
        let mut written = 0;
        while let Some(segment) = self.unstored.front() {
            if let Err(e) = self.long_term.remember(segment) {
                warn!(error = %e, queued = self.unstored.len(), "segment write failed, kept for retry");
                return Err(e);
            }
            let _ = self.unstored.pop_front();
            written += 1;
        }
        Ok(written)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Retrieval
    // ─────────────────────────────────────────────────────────────────────

    /// Hybrid retrieval: entity hits first, then similarity with MMR.
    ///
    /// An entity hit is only admitted when the chunk is also among the
    /// query's top similarity candidates.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<MemoryChunk>> {
        if k == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let store = self.long_term.store();
        let pool_size = k.saturating_mul(self.config.mmr_pool_mult);
        let pool = store.search(
            query,
            &SearchOptions::top_k(pool_size.max(MIN_ENTITY_CANDIDATE_POOL)),
        )?;

        let mut picked: Vec<MemoryChunk> = Vec::with_capacity(k);
        let mut seen: HashSet<String> = HashSet::new();
        {
            let index = self.long_term.index().lock();
            'entities: for entity in extract_entities(query) {
                for id in index.lookup(&entity, k) {
                    if picked.len() >= k {
                        break 'entities;
                    }
                    if seen.contains(&id) {
                        continue;
                    }
                    if let Some(chunk) = pool.iter().find(|c| c.id == id) {
                        picked.push(chunk.clone());
                        let _ = seen.insert(id);
                    }
                }
            }
        }
        let entity_hits = picked.len();

        if picked.len() < k {
            let opts = SearchOptions::top_k(k)
                .with_mmr(self.config.mmr_lambda)
                .with_candidate_pool(pool_size);
            for chunk in store.search(query, &opts)? {
                if picked.len() >= k {
                    break;
                }
                if seen.insert(chunk.id.clone()) {
                    picked.push(chunk);
                }
            }
        }

        debug!(k, entity_hits, total = picked.len(), "memory retrieved");
        Ok(picked)
    }

    /// Retrieval breadth that fits under `max_prompt_tokens`.
    ///
    /// Without a ceiling this is `retrieval_k`. With one, the ceiling minus a
    /// fixed overhead and the query's own cost is divided by a per-item
    /// estimate, capped at `retrieval_k`.
    pub fn effective_retrieval_k(&self, query: &str, max_prompt_tokens: Option<usize>) -> usize {
        let Some(ceiling) = max_prompt_tokens else {
            return self.config.retrieval_k;
        };
        let headroom = ceiling
            .saturating_sub(RETRIEVAL_OVERHEAD_TOKENS)
            .saturating_sub(estimate_tokens(query));
        (headroom / TOKENS_PER_RETRIEVED_ITEM).min(self.config.retrieval_k)
    }

    /// Assemble `sink ++ system ++ retrieved ++ recent` for `query`.
    ///
    /// Retrieved chunks are rendered as system messages tagged
    /// `[memory:{id}]`. With a ceiling, the sequence is budgeted keeping the
    /// last six messages.
    pub fn get_augmented_context(
        &self,
        query: &str,
        max_prompt_tokens: Option<usize>,
    ) -> Result<Vec<Message>> {
        let k = self.effective_retrieval_k(query, max_prompt_tokens);
        let retrieved = self.retrieve(query, k)?;

        let mut messages = Vec::with_capacity(
            self.sink.len() + self.system.len() + retrieved.len() + self.recent.len(),
        );
        messages.extend(self.sink.iter().cloned());
        messages.extend(self.system.iter().cloned());
        messages.extend(
            retrieved
                .into_iter()
                .map(|chunk| Message::system(format!("[memory:{}] {}", chunk.id, chunk.text))),
        );
        messages.extend(self.recent.iter().cloned());

        let Some(max_prompt_tokens) = max_prompt_tokens else {
            return Ok(messages);
        };
        let budgeted = budget_messages(
            &messages,
            &BudgetOptions {
                max_prompt_tokens,
                keep_last_n: AUGMENT_KEEP_LAST_N,
                max_single_message_tokens: AUGMENT_MAX_SINGLE_MESSAGE_TOKENS,
            },
        );
        Ok(budgeted.messages)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Drop all conversation state, unwritten segments included.
    ///
    /// Long-term memory is reset too when it is private to this manager or
    /// `preserve_long_term` is false.
    pub fn clear(&mut self, preserve_long_term: bool) -> Result<()> {
        self.sink.clear();
        self.system.clear();
        self.recent.clear();
        self.segmenter.reset();
        self.pending_role = None;
        self.unstored.clear();
        if self.private_memory || !preserve_long_term {
            self.long_term.reset()?;
        }
        info!(
            preserve_long_term,
            private = self.private_memory,
            "context cleared"
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    /// Pinned leading messages.
    pub fn sink(&self) -> &[Message] {
        &self.sink
    }

    /// System-context ring, oldest first.
    pub fn system(&self) -> &VecDeque<Message> {
        &self.system
    }

    /// Recent window, oldest first.
    pub fn recent(&self) -> &VecDeque<Message> {
        &self.recent
    }

    /// The long-term memory this manager writes to.
    pub fn long_term(&self) -> &LongTermMemory {
        &self.long_term
    }

    /// Active configuration.
    pub fn config(&self) -> &ContextManagerConfig {
        &self.config
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
