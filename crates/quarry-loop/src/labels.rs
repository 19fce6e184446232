//! Turning validated records back into class indices, in query order.

use std::collections::HashMap;

use quarry_core::errors::{QuarryError, QuarryResult};
use quarry_core::models::{AnnotationRecord, Dataset};

/// Labels for `queried`, aligned to its order.
///
/// Records may arrive in any order; each one is placed by its
/// `metadata.dataset_index`. Every record must belong to `batch_id`, name a
/// queried row exactly once, and carry an annotation that is a known class.
pub fn align_labels(
    batch_id: u64,
    queried: &[usize],
    records: &[AnnotationRecord],
    dataset: &Dataset,
) -> QuarryResult<Vec<usize>> {
    let positions: HashMap<usize, usize> = queried
        .iter()
        .enumerate()
        .map(|(position, &index)| (index, position))
        .collect();
    let mut labels: Vec<Option<usize>> = vec![None; queried.len()];

    for record in records {
        let mismatch = |reason: String| QuarryError::BatchMismatch {
            batch_id,
            record_id: record.id.to_string(),
            reason,
        };
        if record.batch_id() != Some(batch_id) {
            return Err(mismatch(format!("tagged with batch {:?}", record.batch_id())));
        }
        let position = record
            .dataset_index()
            .and_then(|index| positions.get(&index).copied())
            .ok_or_else(|| mismatch(format!("row {:?} was not queried", record.dataset_index())))?;
        let name = record
            .annotation
            .as_deref()
            .ok_or_else(|| QuarryError::MissingAnnotation {
                batch_id,
                record_id: record.id.to_string(),
            })?;
        let label = dataset
            .label_index(name)
            .ok_or_else(|| QuarryError::UnknownLabel {
                batch_id,
                record_id: record.id.to_string(),
                label: name.to_string(),
            })?;
        if labels[position].replace(label).is_some() {
            return Err(mismatch("row delivered twice".to_string()));
        }
    }

    labels
        .into_iter()
        .zip(queried)
        .map(|(label, &index)| {
            label.ok_or_else(|| QuarryError::BatchMismatch {
                batch_id,
                record_id: format!("{batch_id}_?"),
                reason: format!("no annotation arrived for row {index}"),
            })
        })
        .collect()
}
