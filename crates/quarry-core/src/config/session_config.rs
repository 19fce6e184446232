use serde::{Deserialize, Serialize};

use super::defaults;

/// Loop session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Collection receiving queried batches. Seed records go to `<collection>-initial`.
    pub collection: String,
    /// JSONL file with one `{"text": ..., "label": ...}` object per line.
    pub dataset_path: String,
    /// Where the learner snapshot is written on interrupt or completion.
    pub snapshot_path: String,
    /// Resume from an existing snapshot instead of seeding a new learner.
    pub resume: bool,
    /// Stop after this many batches. Unset = run until interrupted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_batches: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            collection: defaults::DEFAULT_COLLECTION.to_string(),
            dataset_path: defaults::DEFAULT_DATASET_PATH.to_string(),
            snapshot_path: defaults::DEFAULT_SNAPSHOT_PATH.to_string(),
            resume: defaults::DEFAULT_RESUME,
            max_batches: None,
        }
    }
}
