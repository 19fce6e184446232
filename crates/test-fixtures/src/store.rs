//! Store wrapper that records every query and can act as the annotator.

use std::sync::{Arc, Mutex};

use quarry_core::errors::{QuarryResult, StoreError};
use quarry_core::models::{AnnotationRecord, RecordStatus};
use quarry_core::traits::{AnnotationStore, Cancellable, CancellationToken};
use quarry_store::InMemoryStore;

type QueryHook = Box<dyn Fn(&InMemoryStore, &str, usize) + Send + Sync>;

/// Wraps an [`InMemoryStore`].
///
/// Before each query the optional hook runs with the inner store, the
/// collection name, and the 1-based query number, so tests can edit records
/// "between polls" the way a human annotator would.
pub struct ScriptedStore {
    inner: Arc<InMemoryStore>,
    hook: Option<QueryHook>,
    cancel_after: Option<(usize, CancellationToken)>,
    fail_on: Option<usize>,
    filters: Mutex<Vec<(String, String)>>,
}

impl ScriptedStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            hook: None,
            cancel_after: None,
            fail_on: None,
            filters: Mutex::new(Vec::new()),
        }
    }

    pub fn on_query<F>(mut self, hook: F) -> Self
    where
        F: Fn(&InMemoryStore, &str, usize) + Send + Sync + 'static,
    {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Cancel `token` once `queries` queries have been answered.
    pub fn cancel_after(mut self, queries: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((queries, token));
        self
    }

    /// Fail the `query`-th query with a backend error.
    pub fn fail_on(mut self, query: usize) -> Self {
        self.fail_on = Some(query);
        self
    }

    /// Annotator that validates every pending record of `collection`, labeling
    /// it with `label_for(record)`.
    pub fn validating(
        inner: Arc<InMemoryStore>,
        collection: &str,
        label_for: impl Fn(&AnnotationRecord) -> String + Send + Sync + 'static,
    ) -> Self {
        let target = collection.to_string();
        Self::new(inner).on_query(move |store, queried, _| {
            if queried != target {
                return;
            }
            for record in store.records(queried).unwrap() {
                if record.status == RecordStatus::Pending {
                    let label = label_for(&record);
                    store
                        .mutate(queried, &record.id, |r| {
                            r.annotation = Some(label);
                            r.status = RecordStatus::Validated;
                        })
                        .unwrap();
                }
            }
        })
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    pub fn query_count(&self) -> usize {
        self.filters.lock().unwrap().len()
    }

    /// Every `(collection, filter)` pair queried so far.
    pub fn filters(&self) -> Vec<(String, String)> {
        self.filters.lock().unwrap().clone()
    }
}

impl AnnotationStore for ScriptedStore {
    fn write(&self, records: &[AnnotationRecord], collection: &str) -> QuarryResult<usize> {
        self.inner.write(records, collection)
    }

    fn query(&self, collection: &str, filter: &str) -> QuarryResult<Vec<AnnotationRecord>> {
        let number = {
            let mut filters = self.filters.lock().unwrap();
            filters.push((collection.to_string(), filter.to_string()));
            filters.len()
        };
        if let Some(hook) = &self.hook {
            hook(&self.inner, collection, number);
        }
        if self.fail_on == Some(number) {
            return Err(StoreError::SqliteError {
                message: format!("scripted failure on query {number}"),
            }
            .into());
        }
        let result = self.inner.query(collection, filter);
        if let Some((after, token)) = &self.cancel_after {
            if number >= *after {
                token.cancel();
            }
        }
        result
    }
}
