//! Long-term store selection.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which long-term memory backend to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process store, lost on exit.
    #[default]
    Ephemeral,
    /// `SQLite` file on disk.
    Durable,
}

/// Long-term store settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Backend kind.
    pub backend: StoreBackend,
    /// Database file for the durable backend. Defaults to
    /// `~/.strata/memory.sqlite`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

impl StoreSettings {
    /// Database file to open for the durable backend.
    pub fn resolved_db_path(&self) -> PathBuf {
        self.db_path
            .as_ref()
            .map_or_else(|| crate::loader::strata_dir().join("memory.sqlite"), PathBuf::from)
    }
}
