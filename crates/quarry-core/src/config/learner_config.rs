use serde::{Deserialize, Serialize};

use super::defaults;

/// Active learner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    /// Number of pool samples queried per batch.
    pub query_batch_size: usize,
    /// Size of the stratified initial seed.
    pub seed_size: usize,
    /// Query strategy: "breaking-ties" or "random".
    pub strategy: String,
    /// Width of the hashed feature vectors.
    pub feature_dimensions: usize,
    /// Softmax temperature of the nearest-centroid classifier.
    pub temperature: f64,
    /// RNG seed for seeding and random sampling. Unset = entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            query_batch_size: defaults::DEFAULT_QUERY_BATCH_SIZE,
            seed_size: defaults::DEFAULT_SEED_SIZE,
            strategy: defaults::DEFAULT_STRATEGY.to_string(),
            feature_dimensions: defaults::DEFAULT_FEATURE_DIMENSIONS,
            temperature: defaults::DEFAULT_TEMPERATURE,
            rng_seed: None,
        }
    }
}
