use serde::{Deserialize, Serialize};

use super::defaults;

/// Annotation polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Poll priority tier: "critical", "high", "medium", "low".
    pub priority: String,
    /// Wait before each store read, so freshly written records are indexed (milliseconds).
    pub refresh_wait_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            priority: defaults::DEFAULT_PRIORITY.to_string(),
            refresh_wait_ms: defaults::DEFAULT_REFRESH_WAIT_MS,
        }
    }
}
