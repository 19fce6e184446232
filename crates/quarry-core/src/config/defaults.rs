// Single source of truth for all default values.

// --- Stream ---
pub const DEFAULT_PRIORITY: &str = "medium";
pub const DEFAULT_REFRESH_WAIT_MS: u64 = 1_000;

// --- Learner ---
pub const DEFAULT_QUERY_BATCH_SIZE: usize = 20;
pub const DEFAULT_SEED_SIZE: usize = 20;
pub const DEFAULT_STRATEGY: &str = "breaking-ties";
pub const DEFAULT_FEATURE_DIMENSIONS: usize = 4_096;
pub const DEFAULT_TEMPERATURE: f64 = 10.0;

// --- Session ---
pub const DEFAULT_COLLECTION: &str = "active-learning-test-batch";
pub const DEFAULT_DATASET_PATH: &str = "data/train.jsonl";
pub const DEFAULT_SNAPSHOT_PATH: &str = "active_learner.snapshot";
pub const DEFAULT_RESUME: bool = false;

// --- Store ---
pub const DEFAULT_STORE_BACKEND: &str = "sqlite";
pub const DEFAULT_DB_PATH: &str = "quarry.db";

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_JSON: bool = false;
