use quarry_core::errors::*;

#[test]
fn unknown_label_carries_batch_and_record() {
    let err = QuarryError::UnknownLabel {
        batch_id: 4,
        record_id: "4_17".into(),
        label: "WEATHER".into(),
    };
    let msg = err.to_string();
    assert!(msg.contains("WEATHER"));
    assert!(msg.contains("4_17"));
    assert!(msg.contains("batch 4"));
}

#[test]
fn label_count_mismatch_carries_values() {
    let err = LearnerError::LabelCountMismatch {
        expected: 20,
        actual: 19,
    };
    let msg = err.to_string();
    assert!(msg.contains("20"));
    assert!(msg.contains("19"));
}

// --- From impls ---

#[test]
fn store_error_converts_and_reports_not_found() {
    let err: QuarryError = StoreError::CollectionNotFound {
        collection: "batches".into(),
    }
    .into();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("batches"));
}

#[test]
fn other_store_errors_are_not_not_found() {
    let err: QuarryError = StoreError::SqliteError {
        message: "disk full".into(),
    }
    .into();
    assert!(!err.is_not_found());
}

#[test]
fn learner_error_converts_to_quarry_error() {
    let err: QuarryError = LearnerError::PoolExhausted.into();
    assert!(matches!(err, QuarryError::LearnerError(LearnerError::PoolExhausted)));
    assert!(err.is_pool_exhausted());
    assert!(!QuarryError::from(LearnerError::NoPendingQuery).is_pool_exhausted());
}

#[test]
fn cancelled_is_recognised() {
    assert!(QuarryError::Cancelled.is_cancelled());
    assert!(!QuarryError::ConfigError("x".into()).is_cancelled());
}
