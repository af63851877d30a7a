//! # strata-settings
//!
//! Layered configuration for the strata memory engine.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`StrataSettings::default()`]
//! 2. **User file**: `~/.strata/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `STRATA_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use strata_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("recent window: {}", settings.memory.l1_max_turns);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides_from, deep_merge, load_settings, load_settings_from_path,
    settings_path, strata_dir,
};
pub use types::*;

use std::sync::OnceLock;

static SETTINGS: OnceLock<StrataSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.strata/settings.json` with env var
/// overrides. If loading fails, logs the error and returns compiled defaults.
pub fn get_settings() -> &'static StrataSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            StrataSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: StrataSettings) -> std::result::Result<(), StrataSettings> {
    SETTINGS.set(settings)
}
