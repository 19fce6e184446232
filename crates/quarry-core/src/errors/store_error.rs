/// Annotation store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("collection not found: {collection}")]
    CollectionNotFound { collection: String },

    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("corrupt record {id} in collection {collection}: {reason}")]
    CorruptRecord {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("store lock poisoned")]
    LockPoisoned,
}
