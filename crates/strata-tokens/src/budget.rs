//! Prompt budgeting over a message sequence.
//!
//! The last `keep_last_n` messages are never dropped: they count against the
//! ceiling but do not gate it, so a long tail can push the total over
//! `max_prompt_tokens`. Older messages are packed greedily newest-first and
//! a message that does not fit is skipped without stopping the scan.

use std::collections::VecDeque;

use strata_core::Message;
use tracing::debug;

use crate::estimate::{estimate_message_tokens, estimate_tokens, truncate_text_to_tokens};

/// Options for [`budget_messages`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetOptions {
    /// Prompt ceiling. Zero selects nothing.
    pub max_prompt_tokens: usize,
    /// Number of trailing messages always kept.
    pub keep_last_n: usize,
    /// Per-message ceiling; longer content is truncated.
    pub max_single_message_tokens: usize,
}

impl Default for BudgetOptions {
    fn default() -> Self {
        Self {
            max_prompt_tokens: 0,
            keep_last_n: 4,
            max_single_message_tokens: 900,
        }
    }
}

/// Output of [`budget_messages`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BudgetedMessages {
    /// Selected messages in chronological order.
    pub messages: Vec<Message>,
    /// Estimated cost of `messages`.
    pub total_tokens: usize,
}

/// Select the messages that fit under `opts.max_prompt_tokens`.
pub fn budget_messages(messages: &[Message], opts: &BudgetOptions) -> BudgetedMessages {
    if opts.max_prompt_tokens == 0 || messages.is_empty() {
        return BudgetedMessages::default();
    }

    let trimmed: Vec<Message> = messages
        .iter()
        .map(|m| {
            if estimate_tokens(&m.content) > opts.max_single_message_tokens {
                Message::new(
                    m.role,
                    truncate_text_to_tokens(&m.content, opts.max_single_message_tokens),
                )
            } else {
                m.clone()
            }
        })
        .collect();

    let split = trimmed.len().saturating_sub(opts.keep_last_n);
    let (head, tail) = trimmed.split_at(split);

    let mut total: usize = tail.iter().map(estimate_message_tokens).sum();
    let mut out: VecDeque<Message> = tail.iter().cloned().collect();
    let mut skipped = 0_usize;

    for message in head.iter().rev() {
        let cost = estimate_message_tokens(message);
        if total + cost > opts.max_prompt_tokens {
            skipped += 1;
            continue;
        }
        out.push_front(message.clone());
        total += cost;
    }

    debug!(
        kept = out.len(),
        skipped,
        total_tokens = total,
        max_prompt_tokens = opts.max_prompt_tokens,
        "budgeted messages"
    );

    BudgetedMessages {
        messages: out.into(),
        total_tokens: total,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
