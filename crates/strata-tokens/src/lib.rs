//! # strata-tokens
//!
//! Token estimation and prompt budgeting.
//!
//! 1. **Estimation**: [`estimate_tokens`] weighs ASCII characters at ¼ token
//!    and everything else (CJK in practice) at ⅔ token. It is a cheap proxy,
//!    not a tokenizer.
//! 2. **Truncation**: [`truncate_text_to_tokens`] cuts oversized text on a
//!    character-count proxy.
//! 3. **Budgeting**: [`budget_messages`] selects the messages that fit a
//!    prompt ceiling while always keeping the conversation tail.
//!
//! # Usage
//!
//! ```
//! use strata_core::Message;
//! use strata_tokens::{budget_messages, BudgetOptions};
//!
//! let msgs = vec![Message::system("a".repeat(5000)), Message::user("hi")];
//! let budgeted = budget_messages(&msgs, &BudgetOptions {
//!     max_prompt_tokens: 100,
//!     keep_last_n: 1,
//!     max_single_message_tokens: 50,
//! });
//! assert_eq!(budgeted.messages.last().unwrap().content, "hi");
//! assert!(budgeted.total_tokens <= 100);
//! ```

#![deny(unsafe_code)]

pub mod budget;
pub mod estimate;

pub use budget::{BudgetOptions, BudgetedMessages, budget_messages};
pub use estimate::{estimate_message_tokens, estimate_tokens, truncate_text_to_tokens};
