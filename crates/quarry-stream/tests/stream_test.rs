//! Integration tests for the polling query stream, driven by a manual clock
//! over the in-memory store.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use quarry_core::models::{AnnotationRecord, RecordId, RecordStatus};
use quarry_core::traits::{AnnotationStore, CancellationToken, Clock};
use quarry_core::QuarryError;
use quarry_store::InMemoryStore;
use quarry_stream::{Priority, QueryStream};
use test_fixtures::{ManualClock, ScriptedStore};

const TEMPLATE: &str = "status:Validated AND metadata.batch_id:{batch_id}";

fn validated(id: &str, batch_id: u64) -> AnnotationRecord {
    AnnotationRecord::new(id, format!("question {id}"))
        .with_status(RecordStatus::Validated)
        .with_annotation("LOC")
        .with_metadata("batch_id", batch_id)
}

/// Clock plus store holding `count` validated records of batch 0, written one
/// second before the stream starts.
fn seeded(count: usize) -> (Arc<ManualClock>, Arc<InMemoryStore>) {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(InMemoryStore::with_clock(clock.clone()));
    let records: Vec<_> = (0..count).map(|i| validated(&format!("0_{i}"), 0)).collect();
    store.write(&records, "batches").unwrap();
    clock.advance(Duration::from_secs(1));
    (clock, store)
}

fn stream_over(
    store: Arc<ScriptedStore>,
    clock: Arc<ManualClock>,
    token: CancellationToken,
    unique: bool,
) -> QueryStream {
    QueryStream::builder(store, "batches", TEMPLATE)
        .param("batch_id", 0)
        .priority(Priority::Medium)
        .unique(unique)
        .refresh_wait(Duration::ZERO)
        .clock(clock)
        .cancellation(token)
        .build()
}

// ---- Windowing ----

#[test]
fn first_poll_window_is_open_and_later_windows_abut() {
    let (clock, inner) = seeded(3);
    let token = CancellationToken::new();
    let store = Arc::new(ScriptedStore::new(inner).cancel_after(2, token.clone()));
    let mut stream = stream_over(store.clone(), clock, token, true);

    assert_eq!(stream.next_batch(3).unwrap().len(), 3);
    assert!(matches!(stream.next_record(), Err(QuarryError::Cancelled)));

    let filters = store.filters();
    assert_eq!(filters.len(), 2);
    assert_eq!(
        filters[0].1,
        "status:Validated AND metadata.batch_id:0 AND \
         last_updated:[* TO 2026-01-01T00:00:01.000000Z}"
    );
    assert_eq!(
        filters[1].1,
        "status:Validated AND metadata.batch_id:0 AND \
         last_updated:[2026-01-01T00:00:01.000000Z TO 2026-01-01T00:00:11.000000Z}"
    );
}

#[test]
fn priority_delay_separates_poll_cycles() {
    let (clock, inner) = seeded(0);
    let token = CancellationToken::new();
    let store = Arc::new(ScriptedStore::new(inner).cancel_after(3, token.clone()));
    let mut stream = QueryStream::builder(store, "batches", TEMPLATE)
        .param("batch_id", 0)
        .priority(Priority::High)
        .refresh_wait(Duration::from_millis(250))
        .clock(clock.clone())
        .cancellation(token)
        .build();

    assert!(stream.next_record().unwrap_err().is_cancelled());
    // Three refresh waits and two priority delays; the third delay is cut
    // short by cancellation before its first slice.
    assert_eq!(
        clock.total_slept(),
        Duration::from_millis(3 * 250) + Duration::from_secs(2 * 5)
    );
    assert_eq!(stream.cycles(), 3);
}

#[test]
fn start_from_bounds_the_first_window() {
    let (clock, inner) = seeded(2);
    let token = CancellationToken::new();
    let store = Arc::new(ScriptedStore::new(inner).cancel_after(1, token.clone()));
    let mut stream = QueryStream::builder(store, "batches", TEMPLATE)
        .param("batch_id", 0)
        .refresh_wait(Duration::ZERO)
        .clock(clock.clone())
        .cancellation(token)
        .start_from(Some(clock.now()))
        .build();

    // The records predate the window start, so nothing is delivered.
    assert!(stream.next_record().unwrap_err().is_cancelled());
    assert_eq!(stream.seen_count(), 0);
}

// ---- Dedup ----

#[test]
fn unique_stream_ignores_later_edits() {
    let (clock, inner) = seeded(3);
    let token = CancellationToken::new();
    let store = Arc::new(ScriptedStore::new(inner.clone()).cancel_after(2, token.clone()));
    let mut stream = stream_over(store, clock, token, true);

    let first = stream.next_batch(3).unwrap();
    assert_eq!(first.len(), 3);

    inner
        .mutate("batches", &"0_1".into(), |r| r.annotation = Some("HUM".into()))
        .unwrap();
    assert!(stream.next_record().unwrap_err().is_cancelled());
    assert_eq!(stream.seen_count(), 3);
}

#[test]
fn non_unique_stream_redelivers_edited_records() {
    let (clock, inner) = seeded(3);
    let token = CancellationToken::new();
    let store = Arc::new(ScriptedStore::new(inner.clone()).cancel_after(2, token.clone()));
    let mut stream = stream_over(store, clock, token, false);

    stream.next_batch(3).unwrap();
    inner
        .mutate("batches", &"0_1".into(), |r| r.annotation = Some("HUM".into()))
        .unwrap();

    let again = stream.next_record().unwrap();
    assert_eq!(again.id, RecordId::from("0_1"));
    assert_eq!(again.annotation.as_deref(), Some("HUM"));
}

// ---- Parameters ----

#[test]
fn set_param_retargets_the_next_poll() {
    let (clock, inner) = seeded(2);
    let token = CancellationToken::new();
    let store = Arc::new(ScriptedStore::new(inner.clone()));
    let mut stream = stream_over(store.clone(), clock, token, true);

    let batch_zero = stream.next_batch(2).unwrap();
    assert!(batch_zero.iter().all(|r| r.batch_id() == Some(0)));

    inner
        .write(&[validated("1_0", 1), validated("1_1", 1)], "batches")
        .unwrap();
    stream.set_param("batch_id", 1);
    let batch_one = stream.next_batch(2).unwrap();
    assert!(batch_one.iter().all(|r| r.batch_id() == Some(1)));

    let (_, last_filter) = store.filters().pop().unwrap();
    assert!(last_filter.starts_with("status:Validated AND metadata.batch_id:1 AND"));
}

#[test]
fn missing_placeholder_value_is_invalid_query() {
    let (clock, inner) = seeded(1);
    let store = Arc::new(ScriptedStore::new(inner));
    let mut stream = QueryStream::builder(store, "batches", "metadata.batch_id:{batch_id} AND {word}")
        .param("batch_id", 0)
        .refresh_wait(Duration::ZERO)
        .clock(clock)
        .build();

    assert!(matches!(
        stream.next_record(),
        Err(QuarryError::InvalidQuery { .. })
    ));
}

// ---- Failure handling ----

#[test]
fn missing_collection_is_treated_as_empty() {
    let (clock, inner) = seeded(0);
    let token = CancellationToken::new();
    let store = Arc::new(ScriptedStore::new(inner).cancel_after(3, token.clone()));
    let mut stream = QueryStream::builder(store.clone(), "not-yet-created", TEMPLATE)
        .param("batch_id", 0)
        .refresh_wait(Duration::ZERO)
        .clock(clock)
        .cancellation(token)
        .build();

    assert!(stream.next_record().unwrap_err().is_cancelled());
    assert_eq!(store.query_count(), 3);
}

#[test]
fn backend_failure_propagates_and_keeps_partial_batch() {
    let (clock, inner) = seeded(2);
    let store = Arc::new(ScriptedStore::new(inner.clone()).fail_on(2));
    let mut stream = stream_over(store, clock, CancellationToken::new(), true);

    let err = stream.next_batch(3).unwrap_err();
    assert!(matches!(err, QuarryError::StoreError(_)));

    // The two records read before the failure are still buffered.
    inner.write(&[validated("0_9", 0)], "batches").unwrap();
    let batch = stream.next_batch(3).unwrap();
    let ids: Vec<String> = batch.iter().map(|r| r.id.to_string()).collect();
    assert_eq!(ids, vec!["0_0", "0_1", "0_9"]);
}

#[test]
fn cancellation_interrupts_sleep_before_first_slice() {
    let (clock, inner) = seeded(0);
    let token = CancellationToken::new();
    let store = Arc::new(ScriptedStore::new(inner).cancel_after(1, token.clone()));
    let mut stream = QueryStream::builder(store, "batches", TEMPLATE)
        .param("batch_id", 0)
        .priority(Priority::Low)
        .refresh_wait(Duration::ZERO)
        .clock(clock.clone())
        .cancellation(token)
        .build();

    assert!(stream.next_record().unwrap_err().is_cancelled());
    assert_eq!(clock.total_slept(), Duration::ZERO);
}

#[test]
fn iterator_ends_after_reporting_cancellation() {
    let (clock, inner) = seeded(4);
    let token = CancellationToken::new();
    let store = Arc::new(ScriptedStore::new(inner).cancel_after(1, token.clone()));
    let stream = stream_over(store, clock, token, true);

    let items: Vec<_> = stream.collect();
    assert_eq!(items.len(), 5);
    assert!(items[..4].iter().all(Result::is_ok));
    assert!(items[4].as_ref().unwrap_err().is_cancelled());
}

// ---- Batching ----

#[test]
fn batches_reject_zero_size() {
    let (clock, inner) = seeded(1);
    let store = Arc::new(ScriptedStore::new(inner));
    let mut stream = stream_over(store, clock, CancellationToken::new(), true);
    assert!(matches!(
        stream.batches(0).err(),
        Some(QuarryError::InvalidArgument { .. })
    ));
    assert!(matches!(
        stream.next_batch(0),
        Err(QuarryError::InvalidArgument { .. })
    ));
}

#[test]
fn batches_yield_full_chunks_then_stop_on_cancellation() {
    let (clock, inner) = seeded(6);
    let token = CancellationToken::new();
    let store = Arc::new(ScriptedStore::new(inner).cancel_after(1, token.clone()));
    let mut stream = stream_over(store, clock, token, true);

    let chunks: Vec<_> = stream.batches(3).unwrap().collect();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].as_ref().unwrap().len(), 3);
    assert_eq!(chunks[1].as_ref().unwrap().len(), 3);
    assert!(chunks[2].as_ref().unwrap_err().is_cancelled());
}

// ---- Properties ----

fn edit_script() -> impl Strategy<Value = (usize, Vec<HashSet<i64>>)> {
    (1usize..16).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec(prop::collection::hash_set(0..n as i64, 0..n), 0..4),
        )
    })
}

fn run_script(n: usize, rounds: &[HashSet<i64>], unique: bool) -> Vec<AnnotationRecord> {
    let clock = Arc::new(ManualClock::new());
    let inner = Arc::new(InMemoryStore::with_clock(clock.clone()));
    let records: Vec<_> = (0..n as i64)
        .map(|i| {
            AnnotationRecord::new(RecordId::Int(i), "q")
                .with_status(RecordStatus::Validated)
                .with_metadata("batch_id", 0u64)
        })
        .collect();
    inner.write(&records, "batches").unwrap();
    clock.advance(Duration::from_secs(1));

    let token = CancellationToken::new();
    let script = rounds.to_vec();
    let store = Arc::new(
        ScriptedStore::new(inner)
            .on_query(move |store, collection, number| {
                if let Some(edits) = script.get(number - 1) {
                    for &i in edits {
                        store
                            .mutate(collection, &RecordId::Int(i), |r| {
                                r.annotation = Some(format!("round {number}"));
                            })
                            .unwrap();
                    }
                }
            })
            .cancel_after(rounds.len() + 1, token.clone()),
    );
    let stream = stream_over(store, clock, token, unique);
    stream.filter_map(Result::ok).collect()
}

proptest! {
    #[test]
    fn unique_stream_never_repeats_an_id((n, rounds) in edit_script()) {
        let delivered = run_script(n, &rounds, true);
        let ids: HashSet<_> = delivered.iter().map(|r| r.id.clone()).collect();
        prop_assert_eq!(ids.len(), delivered.len());
        prop_assert_eq!(delivered.len(), n);
    }

    #[test]
    fn non_unique_stream_sees_every_surviving_edit((n, rounds) in edit_script()) {
        let delivered = run_script(n, &rounds, false);
        // The initial write is round zero. A write is observed unless the
        // same record is written again before the next poll moves its
        // timestamp out of the window.
        let initial: HashSet<i64> = (0..n as i64).collect();
        let empty = HashSet::new();
        let timeline: Vec<&HashSet<i64>> = std::iter::once(&initial).chain(rounds.iter()).collect();
        let observed: usize = timeline
            .iter()
            .enumerate()
            .map(|(k, writes)| {
                let next = timeline.get(k + 1).copied().unwrap_or(&empty);
                writes.difference(next).count()
            })
            .sum();
        prop_assert_eq!(delivered.len(), observed);
    }
}
