//! Records handed to the annotation UI.

use quarry_core::constants::{METADATA_BATCH_ID, METADATA_DATASET_INDEX};
use quarry_core::errors::{QuarryError, QuarryResult};
use quarry_core::models::{AnnotationRecord, Dataset, RecordId, RecordStatus};

fn text_of(dataset: &Dataset, index: usize) -> QuarryResult<&str> {
    dataset.text(index).ok_or_else(|| QuarryError::InvalidDataset {
        reason: format!("row {index} does not exist"),
    })
}

/// The labeled seed, as already-validated records keyed by dataset index.
pub fn seed_records(
    dataset: &Dataset,
    indices: &[usize],
    labels: &[usize],
) -> QuarryResult<Vec<AnnotationRecord>> {
    indices
        .iter()
        .zip(labels)
        .map(|(&index, &label)| {
            let name = dataset.label_names().get(label).ok_or_else(|| {
                QuarryError::InvalidDataset {
                    reason: format!("row {index} has unknown class {label}"),
                }
            })?;
            Ok(AnnotationRecord::new(RecordId::Int(index as i64), text_of(dataset, index)?)
                .with_annotation(name.as_str())
                .with_status(RecordStatus::Validated)
                .with_metadata(METADATA_DATASET_INDEX, index as u64))
        })
        .collect()
}

/// One query batch as pending records `"{batch_id}_{position}"`, each with a
/// zero-score prediction for every class so the UI can render the choices.
pub fn batch_records(
    dataset: &Dataset,
    batch_id: u64,
    indices: &[usize],
) -> QuarryResult<Vec<AnnotationRecord>> {
    let prediction: Vec<(String, f64)> = dataset
        .label_names()
        .iter()
        .map(|name| (name.clone(), 0.0))
        .collect();
    indices
        .iter()
        .enumerate()
        .map(|(position, &index)| {
            Ok(
                AnnotationRecord::new(format!("{batch_id}_{position}"), text_of(dataset, index)?)
                    .with_prediction(prediction.clone())
                    .with_status(RecordStatus::Pending)
                    .with_metadata(METADATA_BATCH_ID, batch_id)
                    .with_metadata(METADATA_DATASET_INDEX, index as u64),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_records_carry_batch_and_row() {
        let dataset = test_fixtures::synthetic_dataset(10, 2, 4);
        let records = batch_records(&dataset, 3, &[7, 2]).unwrap();
        assert_eq!(records[1].id, RecordId::from("3_1"));
        assert_eq!(records[1].batch_id(), Some(3));
        assert_eq!(records[1].dataset_index(), Some(2));
        assert_eq!(records[1].status, RecordStatus::Pending);
        assert_eq!(
            records[0].prediction,
            Some(vec![("class-0".to_string(), 0.0), ("class-1".to_string(), 0.0)])
        );
    }

    #[test]
    fn seed_records_are_validated_with_class_names() {
        let dataset = test_fixtures::synthetic_dataset(10, 2, 4);
        let records = seed_records(&dataset, &[4, 5], &[0, 1]).unwrap();
        assert_eq!(records[0].id, RecordId::Int(4));
        assert_eq!(records[1].annotation.as_deref(), Some("class-1"));
        assert!(records.iter().all(AnnotationRecord::is_validated));
        assert!(seed_records(&dataset, &[99], &[0]).is_err());
    }
}
