use serde::{Deserialize, Serialize};

use super::defaults;

/// Annotation store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend: "sqlite" or "memory".
    pub backend: String,
    /// SQLite database file, shared with the annotation UI.
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: defaults::DEFAULT_STORE_BACKEND.to_string(),
            db_path: defaults::DEFAULT_DB_PATH.to_string(),
        }
    }
}
