use crate::errors::QuarryResult;
use crate::models::AnnotationRecord;

/// External record store backing the annotation UI.
///
/// Implementations report an unknown collection as
/// `StoreError::CollectionNotFound` rather than an empty result.
pub trait AnnotationStore: Send + Sync {
    /// Upsert `records` into `collection`, creating it if needed.
    /// Returns the number of records written.
    fn write(&self, records: &[AnnotationRecord], collection: &str) -> QuarryResult<usize>;

    /// Every record of `collection` matching `filter`.
    fn query(&self, collection: &str, filter: &str) -> QuarryResult<Vec<AnnotationRecord>>;
}
