//! Character-weighted token estimation.

use strata_core::Message;

/// ASCII characters per token.
const ASCII_CHARS_PER_TOKEN: f64 = 4.0;

/// Non-ASCII characters per token (CJK text packs denser than English).
const NON_ASCII_CHARS_PER_TOKEN: f64 = 1.5;

/// Characters kept per token of budget when truncating.
const TRUNCATE_CHARS_PER_TOKEN: f64 = 3.2;

/// Floor on the character length of truncated text.
const MIN_TRUNCATE_CHARS: usize = 24;

/// Estimate the token cost of `text`.
///
/// Returns 0 for empty text and at least 1 for anything else.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let (ascii, non_ascii) = text.chars().fold((0_usize, 0_usize), |(a, n), ch| {
        if ch.is_ascii() { (a + 1, n) } else { (a, n + 1) }
    });
    let estimate =
        ascii as f64 / ASCII_CHARS_PER_TOKEN + non_ascii as f64 / NON_ASCII_CHARS_PER_TOKEN;
    (estimate as usize).max(1)
}

/// Estimate the cost of a message, counting its role tag.
pub fn estimate_message_tokens(message: &Message) -> usize {
    estimate_tokens(&format!("{}:{}", message.role, message.content))
}

/// Cut `text` down to roughly `max_tokens`.
///
/// Text already within budget is returned unchanged. Otherwise the first
/// `max(24, max_tokens * 3.2)` characters are kept; the result is not
/// guaranteed to estimate under `max_tokens`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn truncate_text_to_tokens(text: &str, max_tokens: usize) -> String {
    if max_tokens == 0 {
        return String::new();
    }
    if estimate_tokens(text) <= max_tokens {
        return text.to_owned();
    }
    let limit = ((max_tokens as f64 * TRUNCATE_CHARS_PER_TOKEN) as usize).max(MIN_TRUNCATE_CHARS);
    text.chars().take(limit).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
