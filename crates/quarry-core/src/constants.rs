/// Quarry system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Format version written into every learner snapshot envelope.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Metadata key carrying the batch generation a record was queried in.
pub const METADATA_BATCH_ID: &str = "batch_id";

/// Metadata key carrying the dataset row a record was built from.
pub const METADATA_DATASET_INDEX: &str = "dataset_index";

/// Suffix appended to the collection name for the pre-validated seed records.
pub const INITIAL_COLLECTION_SUFFIX: &str = "-initial";

/// Store field holding the last write/mutation time of a record.
pub const LAST_UPDATED_FIELD: &str = "last_updated";

/// Filter template used to wait for a fully validated batch.
pub const VALIDATED_BATCH_FILTER: &str = "status:Validated AND metadata.batch_id:{batch_id}";

/// Longest uninterrupted sleep slice; cancellation is checked between slices.
pub const MAX_SLEEP_TICK_MS: u64 = 100;

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV_VAR: &str = "QUARRY_LOG";

/// Environment variable holding the config file path.
pub const CONFIG_ENV_VAR: &str = "QUARRY_CONFIG";
