/// Active learner errors.
#[derive(Debug, thiserror::Error)]
pub enum LearnerError {
    #[error("active learner has not been initialized")]
    NotInitialized,

    #[error("active learner is already initialized")]
    AlreadyInitialized,

    #[error("unlabeled pool is exhausted")]
    PoolExhausted,

    #[error("no outstanding query to update")]
    NoPendingQuery,

    #[error("label count mismatch: expected {expected}, got {actual}")]
    LabelCountMismatch { expected: usize, actual: usize },

    #[error("index {index} out of range for dataset of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("index {index} given more than once")]
    DuplicateIndex { index: usize },

    #[error("label {label} out of range for {num_classes} classes")]
    LabelOutOfRange { label: usize, num_classes: usize },

    #[error("no labeled rows to sample from")]
    EmptyPopulation,

    #[error("invalid snapshot {path}: {reason}")]
    SnapshotInvalid { path: String, reason: String },

    #[error("unknown query strategy: {name}")]
    UnknownStrategy { name: String },
}
