use std::path::Path;

use crate::errors::QuarryResult;

/// Pool-based active learner, as driven by the loop.
///
/// Owns the unlabeled pool and the model; the loop only ever sees pool
/// indices and class indices.
pub trait ActiveLearner {
    /// Label the seed rows and fit the first model.
    fn initialize(&mut self, indices: &[usize], labels: &[usize]) -> QuarryResult<()>;

    /// Up to `num_samples` distinct pool indices to annotate next.
    /// Replaces any outstanding, unanswered query.
    fn query(&mut self, num_samples: usize) -> QuarryResult<Vec<usize>>;

    /// Labels for the outstanding query, in query order. Removes those
    /// indices from the pool and refits.
    fn update(&mut self, labels: &[usize]) -> QuarryResult<()>;

    /// Persist the full learner state to `path`.
    fn save(&self, path: &Path) -> QuarryResult<()>;

    /// Rows still eligible for querying.
    fn pool_len(&self) -> usize;

    /// Rows labeled so far, seed included.
    fn labeled_len(&self) -> usize;

    /// Number of successful `update` calls.
    fn batches_completed(&self) -> u64;
}
