//! Error types. One top-level [`QuarryError`] with structured variants and
//! `From` conversions from the subsystem errors.

mod learner_error;
mod store_error;

pub use learner_error::LearnerError;
pub use store_error::StoreError;

/// Convenience alias used across the workspace.
pub type QuarryResult<T> = Result<T, QuarryError>;

/// Top-level error for every Quarry operation.
#[derive(Debug, thiserror::Error)]
pub enum QuarryError {
    #[error("invalid query `{query}`: {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("unknown label `{label}` on record {record_id} of batch {batch_id}")]
    UnknownLabel {
        batch_id: u64,
        record_id: String,
        label: String,
    },

    #[error("record {record_id} of batch {batch_id} is validated but carries no annotation")]
    MissingAnnotation { batch_id: u64, record_id: String },

    #[error("record {record_id} does not belong to batch {batch_id}: {reason}")]
    BatchMismatch {
        batch_id: u64,
        record_id: String,
        reason: String,
    },

    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("invalid dataset: {reason}")]
    InvalidDataset { reason: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("learner error: {0}")]
    LearnerError(#[from] LearnerError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuarryError {
    /// Whether the error is the store's "collection not found" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            QuarryError::StoreError(StoreError::CollectionNotFound { .. })
        )
    }

    /// Whether the error is a cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, QuarryError::Cancelled)
    }

    /// Whether the learner ran out of unlabeled rows.
    pub fn is_pool_exhausted(&self) -> bool {
        matches!(self, QuarryError::LearnerError(LearnerError::PoolExhausted))
    }
}
