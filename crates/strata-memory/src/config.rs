//! Context manager configuration.

use strata_settings::MemorySettings;

use crate::errors::{MemoryError, Result};
use crate::segmenter::SegmenterConfig;

/// Tier sizes and retrieval knobs for a [`ContextManager`](crate::ContextManager).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContextManagerConfig {
    /// Capacity of the recent tier.
    pub l1_max_turns: usize,
    /// Number of earliest messages pinned forever.
    pub sink_turns: usize,
    /// Default number of memory chunks retrieved per turn.
    pub retrieval_k: usize,
    /// Capacity of the system-context ring.
    pub system_max: usize,
    /// MMR trade-off for the similarity half of retrieval. 0 disables MMR.
    pub mmr_lambda: f32,
    /// Candidate pool multiplier applied to `k`.
    pub mmr_pool_mult: usize,
    /// Embedding width for privately created stores.
    pub embedding_dim: usize,
    /// Character target for compressed system context.
    pub system_context_chars: usize,
    /// Segmenter thresholds for evicted turns.
    pub segmenter: SegmenterConfig,
}

impl Default for ContextManagerConfig {
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
            segmenter: SegmenterConfig::conversation(),
        }
    }
}

impl ContextManagerConfig {
    /// Build from the settings layer.
    pub fn from_settings(settings: &MemorySettings) -> Self {
        Self {
            l1_max_turns: settings.l1_max_turns,
            sink_turns: settings.sink_turns,
            retrieval_k: settings.retrieval_k,
            system_max: settings.system_max,
            mmr_lambda: settings.mmr_lambda,
            mmr_pool_mult: settings.mmr_pool_mult,
            embedding_dim: settings.embedding_dim,
            system_context_chars: settings.system_context_chars,
            segmenter: SegmenterConfig::from_settings(&settings.segmenter),
        }
    }

    /// Reject values the manager cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.l1_max_turns == 0 {
            return Err(MemoryError::Config("l1_max_turns must be at least 1".into()));
        }
        if self.system_max == 0 {
            return Err(MemoryError::Config("system_max must be at least 1".into()));
        }
        if self.embedding_dim == 0 {
            return Err(MemoryError::Config("embedding_dim must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(MemoryError::Config(format!(
                "mmr_lambda must be within [0, 1], got {}",
                self.mmr_lambda
            )));
        }
        if self.segmenter.max_chars == 0 || self.segmenter.min_chars > self.segmenter.max_chars {
            return Err(MemoryError::Config(
                "segmenter requires min_chars <= max_chars and max_chars > 0".into(),
            ));
        }
        Ok(())
    }
}
