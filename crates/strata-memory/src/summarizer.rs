//! System-context compression.
//!
//! Large system context (retrieved reports, tool output, pasted documents) is
//! squeezed to a character target before it enters the system ring. An
//! optional [`Summarizer`] does the squeezing; any failure degrades to plain
//! truncation.

use strata_core::Message;
use tracing::{debug, warn};

// =============================================================================
// Summarizer Trait
// =============================================================================

/// Chat-completion shaped summarization backend.
///
/// Receives a system + user message pair and returns the model's reply text.
#[cfg_attr(test, mockall::automock)]
pub trait Summarizer: Send + Sync {
    /// Run one completion over `messages`.
    fn summarize(&self, messages: &[Message]) -> Result<String, SummarizerError>;
}

/// Errors a [`Summarizer`] may report. Always absorbed by
/// [`summarize_system_context`].
#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    /// The backend call failed.
    #[error("summarizer call failed: {message}")]
    CallFailed {
        /// Error message.
        message: String,
    },

    /// The backend returned no content.
    #[error("summarizer returned an empty response")]
    EmptyResponse,
}

// =============================================================================
// Compression
// =============================================================================

const SYSTEM_PROMPT: &str = "You are a strict summarizer.";

fn build_prompt(text: &str, target_chars: usize) -> String {
    format!(
        "Compress the material below into a single system-context summary.\n\
         - At most about {target_chars} characters\n\
         - Keep key entities: metrics, time ranges, units, definitions, constraints\n\
         - Do not invent data\n\
         - Plain text only, no numbered lists\n\n\
         Material:\n{text}"
    )
}

fn take_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

/// Compress `text` to roughly `target_chars` characters.
///
/// Blank input or a zero target yields an empty string. Text already within
/// the target is returned trimmed. Otherwise the summarizer is asked for a
/// summary; without one, or when it fails or answers blank, the first
/// `target_chars` characters are kept. A summary longer than twice the target
/// is cut to the target.
pub fn summarize_system_context(
    summarizer: Option<&dyn Summarizer>,
    text: &str,
    target_chars: usize,
) -> String {
    let text = text.trim();
    if text.is_empty() || target_chars == 0 {
        return String::new();
    }
    if text.chars().count() <= target_chars {
        return text.to_owned();
    }
    let Some(summarizer) = summarizer else {
        return take_chars(text, target_chars);
    };

    let messages = [
        Message::system(SYSTEM_PROMPT),
        Message::user(build_prompt(text, target_chars)),
    ];
    match summarizer.summarize(&messages) {
        Ok(out) => {
            let out = out.trim();
            if out.is_empty() {
                warn!("summarizer returned blank output, truncating");
                return take_chars(text, target_chars);
            }
            let out_chars = out.chars().count();
            debug!(input_chars = text.chars().count(), out_chars, "system context summarized");
            if out_chars > target_chars * 2 {
                take_chars(out, target_chars)
            } else {
                out.to_owned()
            }
        }
        Err(e) => {
            warn!(error = %e, "summarizer failed, truncating");
            take_chars(text, target_chars)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
