//! Structured log events for the session lifecycle.
//!
//! Each function emits a `tracing` event with an `event` key and structured
//! fields.

use std::path::Path;

pub fn seed_published(collection: &str, records: usize) {
    tracing::info!(
        event = "seed_published",
        collection = %collection,
        records,
        "seed published"
    );
}

pub fn batch_published(batch_id: u64, records: usize) {
    tracing::info!(
        event = "batch_published",
        batch_id,
        records,
        "batch published, waiting for annotations"
    );
}

pub fn batch_completed(batch_id: u64, labeled: usize, pool: usize) {
    tracing::info!(
        event = "batch_completed",
        batch_id,
        labeled,
        pool,
        "batch folded into the model"
    );
}

pub fn snapshot_saved(path: &Path, batches: u64) {
    tracing::info!(
        event = "snapshot_saved",
        path = %path.display(),
        batches,
        "active learner saved"
    );
}

pub fn run_interrupted(batches: u64) {
    tracing::warn!(event = "run_interrupted", batches, "run interrupted");
}

pub fn run_completed(batches: u64, reason: &str) {
    tracing::info!(
        event = "run_completed",
        batches,
        reason = %reason,
        "run completed"
    );
}
