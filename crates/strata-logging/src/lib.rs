//! # strata-logging
//!
//! Structured logging for strata hosts.
//!
//! - [`init_subscriber`] installs the global `tracing` subscriber from
//!   [`LoggingSettings`]: human-readable or JSON lines on stderr, filtered by
//!   `RUST_LOG` when set and by the configured level otherwise.
//! - [`capture_logs`] installs a thread-local capturing subscriber so tests can
//!   assert on emitted events.

#![deny(unsafe_code)]

pub mod test_utils;

pub use strata_settings::{LogLevel, LoggingSettings};
pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::new(settings.level.as_filter_str())
}

/// Initialize the global tracing subscriber on stderr.
///
/// Call once at startup. Later calls are no-ops.
pub fn init_subscriber(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(settings));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    // try_init fails only when a global subscriber is already set
    let _ = if settings.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
