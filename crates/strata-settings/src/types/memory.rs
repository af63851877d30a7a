//! Conversational memory settings.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Tier sizes and retrieval tuning for the context manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemorySettings {
    /// Capacity of the recent-turns window.
    pub l1_max_turns: usize,
    /// Number of opening messages pinned for the whole session.
    pub sink_turns: usize,
    /// Memories retrieved per query before budgeting.
    pub retrieval_k: usize,
    /// Capacity of the system-context ring.
    pub system_max: usize,
    /// MMR relevance/diversity trade-off; `0` disables reranking.
    pub mmr_lambda: f32,
    /// Candidate pool multiplier applied to the retrieval count.
    pub mmr_pool_mult: usize,
    /// Hashing embedder width.
    pub embedding_dim: usize,
    /// Target length of each compressed system-context entry.
    pub system_context_chars: usize,
    /// Segmentation thresholds for evicted conversation turns.
    pub segmenter: SegmenterSettings,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            l1_max_turns: 12,
            sink_turns: 2,
            retrieval_k: 4,
            system_max: 8,
            mmr_lambda: 0.7,
            mmr_pool_mult: 4,
            embedding_dim: 256,
            system_context_chars: 900,
            segmenter: SegmenterSettings::default(),
        }
    }
}

impl MemorySettings {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.l1_max_turns == 0 {
            return Err(SettingsError::InvalidValue(
                "memory.l1MaxTurns must be at least 1".into(),
            ));
        }
        if self.system_max == 0 {
            return Err(SettingsError::InvalidValue(
                "memory.systemMax must be at least 1".into(),
            ));
        }
        if self.embedding_dim == 0 {
            return Err(SettingsError::InvalidValue(
                "memory.embeddingDim must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(SettingsError::InvalidValue(format!(
                "memory.mmrLambda must be within [0, 1], got {}",
                self.mmr_lambda
            )));
        }
        self.segmenter.validate()
    }
}

/// Thresholds for the streaming segmenter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmenterSettings {
    /// Minimum merged length (chars) before a topic or punctuation boundary may flush.
    pub min_chars: usize,
    /// Merged length (chars) that forces a flush.
    pub max_chars: usize,
    /// Cosine below which an incoming fragment starts a new segment.
    pub boundary_similarity: f32,
    /// Fragment count that forces a flush (never below 2).
    pub max_turns: usize,
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self {
            min_chars: 1,
            max_chars: 560,
            boundary_similarity: 0.35,
            max_turns: 4,
        }
    }
}

impl SegmenterSettings {
    /// Reject inconsistent thresholds.
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 || self.min_chars > self.max_chars {
            return Err(SettingsError::InvalidValue(format!(
                "memory.segmenter requires minChars <= maxChars and maxChars > 0, got {}..{}",
                self.min_chars, self.max_chars
            )));
        }
        Ok(())
    }
}
