//! In-memory annotation store. Collections are maps keyed by record id;
//! every write stamps `last_updated` from the store's clock.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use quarry_core::errors::{QuarryResult, StoreError};
use quarry_core::models::{AnnotationRecord, RecordId};
use quarry_core::traits::{AnnotationStore, Clock, SystemClock};

use crate::query::Filter;

type Collection = BTreeMap<RecordId, AnnotationRecord>;

/// Thread-safe in-memory store.
pub struct InMemoryStore {
    collections: RwLock<BTreeMap<String, Collection>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store whose timestamps come from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            clock,
        }
    }

    /// Apply an annotator edit to one record and bump its `last_updated`.
    /// Returns false if the collection or record does not exist.
    pub fn mutate<F>(&self, collection: &str, id: &RecordId, edit: F) -> QuarryResult<bool>
    where
        F: FnOnce(&mut AnnotationRecord),
    {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let Some(record) = collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
        else {
            return Ok(false);
        };
        edit(record);
        record.id = id.clone();
        record.last_updated = Some(self.clock.now());
        Ok(true)
    }

    /// A copy of one record.
    pub fn get(&self, collection: &str, id: &RecordId) -> QuarryResult<Option<AnnotationRecord>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    /// Every record of a collection, in id order.
    pub fn records(&self, collection: &str) -> QuarryResult<Vec<AnnotationRecord>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    /// Number of records in a collection (0 if absent).
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore for InMemoryStore {
    fn write(&self, records: &[AnnotationRecord], collection: &str) -> QuarryResult<usize> {
        let now = self.clock.now();
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let target = collections.entry(collection.to_string()).or_default();
        for record in records {
            let mut stored = record.clone();
            stored.last_updated = Some(now);
            target.insert(stored.id.clone(), stored);
        }
        tracing::debug!(collection, written = records.len(), "records written");
        Ok(records.len())
    }

    fn query(&self, collection: &str, filter: &str) -> QuarryResult<Vec<AnnotationRecord>> {
        let parsed = Filter::parse(filter)?;
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        let records = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound {
                collection: collection.to_string(),
            })?;

        let mut matched: Vec<AnnotationRecord> = records
            .values()
            .filter(|r| parsed.matches(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            a.last_updated
                .cmp(&b.last_updated)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(matched)
    }
}
