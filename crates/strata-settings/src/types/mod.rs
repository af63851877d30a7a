//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`,
//! so partial JSON deserializes with every missing field at its default.

mod logging;
mod memory;
mod store;

pub use logging::*;
pub use memory::*;
pub use store::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// Loaded from `~/.strata/settings.json` with defaults applied for missing
/// fields. Environment variables can override specific values.
///
/// ```json
/// {
///   "version": "0.1.0",
///   "memory": { "l1MaxTurns": 8 },
///   "store": { "backend": "durable" }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrataSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Context manager tuning.
    pub memory: MemorySettings,
    /// Long-term store selection.
    pub store: StoreSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for StrataSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "strata".to_string(),
            memory: MemorySettings::default(),
            store: StoreSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
