//! Polling query stream over the annotation store.
//!
//! The stream keeps an explicit cursor: a time window `[start, end)` that
//! moves forward every poll cycle, and the set of record ids already seen.
//! Each cycle waits the refresh delay, queries
//! `<filter> AND last_updated:[start TO end}`, buffers the records that pass
//! the dedup rule, then advances `start` to `end`. Between cycles it sleeps
//! for the priority delay.
//!
//! Under `unique` delivery only the first sighting of an id is ever
//! emitted. A record edited again after it was delivered is not observed.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

use quarry_core::config::defaults::DEFAULT_REFRESH_WAIT_MS;
use quarry_core::constants::{LAST_UPDATED_FIELD, MAX_SLEEP_TICK_MS};
use quarry_core::errors::{QuarryError, QuarryResult};
use quarry_core::models::{AnnotationRecord, RecordId};
use quarry_core::traits::{AnnotationStore, Cancellable, CancellationToken, Clock, SystemClock};

use crate::batcher::RecordBatcher;
use crate::priority::Priority;
use crate::template::QueryTemplate;

/// Lazy, unbounded sequence of annotation records read from a store.
pub struct QueryStream {
    store: Arc<dyn AnnotationStore>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    collection: String,
    template: QueryTemplate,
    params: BTreeMap<String, String>,
    priority: Priority,
    unique: bool,
    refresh_wait: Duration,
    window_start: Option<DateTime<Utc>>,
    seen: HashSet<RecordId>,
    buffer: VecDeque<AnnotationRecord>,
    cycles: u64,
    finished: bool,
}

impl QueryStream {
    /// Start building a stream over `collection` filtered by `template`.
    pub fn builder(
        store: Arc<dyn AnnotationStore>,
        collection: impl Into<String>,
        template: impl Into<String>,
    ) -> QueryStreamBuilder {
        QueryStreamBuilder {
            store,
            collection: collection.into(),
            template: QueryTemplate::new(template),
            params: BTreeMap::new(),
            priority: Priority::default(),
            unique: false,
            refresh_wait: Duration::from_millis(DEFAULT_REFRESH_WAIT_MS),
            clock: Arc::new(SystemClock),
            cancel: CancellationToken::new(),
            start_from: None,
        }
    }

    /// Set a query parameter. Takes effect on the next poll cycle.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl ToString) {
        self.params.insert(name.into(), value.to_string());
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Start of the next query window (`None` = open).
    pub fn window_start(&self) -> Option<DateTime<Utc>> {
        self.window_start
    }

    /// Number of distinct ids observed so far.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Completed poll cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Next record, polling the store as often as needed. Blocks until a
    /// record is available or the cancellation token fires.
    pub fn next_record(&mut self) -> QuarryResult<AnnotationRecord> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Ok(record);
            }
            self.poll_cycle()?;
        }
    }

    /// The next `size` records as one chunk.
    ///
    /// On failure the records gathered so far are put back at the head of the
    /// buffer, so a caller that keeps using the stream loses nothing.
    pub fn next_batch(&mut self, size: usize) -> QuarryResult<Vec<AnnotationRecord>> {
        let mut failure = None;
        let chunk = {
            let source = std::iter::from_fn(|| match self.next_record() {
                Ok(record) => Some(record),
                Err(e) => {
                    failure = Some(e);
                    None
                }
            });
            RecordBatcher::new(source, size)?.next().unwrap_or_default()
        };

        match failure {
            Some(e) => {
                for record in chunk.into_iter().rev() {
                    self.buffer.push_front(record);
                }
                Err(e)
            }
            None => Ok(chunk),
        }
    }

    /// Unbounded sequence of `size`-record chunks. Ends after reporting a
    /// cancellation.
    pub fn batches(
        &mut self,
        size: usize,
    ) -> QuarryResult<impl Iterator<Item = QuarryResult<Vec<AnnotationRecord>>> + '_> {
        if size == 0 {
            return Err(QuarryError::InvalidArgument {
                reason: "batch size must be at least 1".to_string(),
            });
        }
        let mut done = false;
        Ok(std::iter::from_fn(move || {
            if done {
                return None;
            }
            let result = self.next_batch(size);
            if matches!(&result, Err(e) if e.is_cancelled()) {
                done = true;
            }
            Some(result)
        }))
    }

    /// One poll cycle. Returns the number of records buffered.
    fn poll_cycle(&mut self) -> QuarryResult<usize> {
        if self.cycles > 0 {
            self.pause(self.priority.delay())?;
        }
        let end = self.clock.now();
        self.pause(self.refresh_wait)?;

        let buffered = self.check_window(self.window_start, end)?;
        self.window_start = Some(end);
        self.cycles += 1;
        Ok(buffered)
    }

    fn check_window(
        &mut self,
        start: Option<DateTime<Utc>>,
        end: DateTime<Utc>,
    ) -> QuarryResult<usize> {
        let filter = self.window_filter(start, end)?;
        let records = match self.store.query(&self.collection, &filter) {
            Ok(records) => records,
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    collection = %self.collection,
                    error = %e,
                    "no collection found, treating poll as empty"
                );
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let fetched = records.len();
        let mut buffered = 0;
        for record in records {
            let first_sighting = self.seen.insert(record.id.clone());
            if !self.unique || first_sighting {
                self.buffer.push_back(record);
                buffered += 1;
            }
        }

        tracing::debug!(
            collection = %self.collection,
            cycle = self.cycles,
            window_start = ?start,
            window_end = %end,
            fetched,
            buffered,
            "poll cycle"
        );
        Ok(buffered)
    }

    fn window_filter(&self, start: Option<DateTime<Utc>>, end: DateTime<Utc>) -> QuarryResult<String> {
        let rendered = self.template.render(&self.params)?;
        let start = start.map_or_else(|| "*".to_string(), timestamp);
        let window = format!("{LAST_UPDATED_FIELD}:[{start} TO {}}}", timestamp(end));
        if rendered.trim().is_empty() {
            Ok(window)
        } else {
            Ok(format!("{rendered} AND {window}"))
        }
    }

    /// Sleep in short slices, bailing out as soon as cancellation is requested.
    fn pause(&self, duration: Duration) -> QuarryResult<()> {
        let tick = Duration::from_millis(MAX_SLEEP_TICK_MS);
        let mut remaining = duration;
        loop {
            if self.cancel.is_cancelled() {
                return Err(QuarryError::Cancelled);
            }
            if remaining.is_zero() {
                return Ok(());
            }
            let step = remaining.min(tick);
            self.clock.sleep(step);
            remaining -= step;
        }
    }
}

impl Iterator for QueryStream {
    type Item = QuarryResult<AnnotationRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_record();
        if matches!(&result, Err(e) if e.is_cancelled()) {
            self.finished = true;
        }
        Some(result)
    }
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Builder for [`QueryStream`].
pub struct QueryStreamBuilder {
    store: Arc<dyn AnnotationStore>,
    collection: String,
    template: QueryTemplate,
    params: BTreeMap<String, String>,
    priority: Priority,
    unique: bool,
    refresh_wait: Duration,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    start_from: Option<DateTime<Utc>>,
}

impl QueryStreamBuilder {
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Deliver each record id at most once.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Minimum wait before every store read.
    pub fn refresh_wait(mut self, wait: Duration) -> Self {
        self.refresh_wait = wait;
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Initial window start. `None` (the default) leaves it open.
    pub fn start_from(mut self, start: Option<DateTime<Utc>>) -> Self {
        self.start_from = start;
        self
    }

    pub fn build(self) -> QueryStream {
        QueryStream {
            store: self.store,
            clock: self.clock,
            cancel: self.cancel,
            collection: self.collection,
            template: self.template,
            params: self.params,
            priority: self.priority,
            unique: self.unique,
            refresh_wait: self.refresh_wait,
            window_start: self.start_from,
            seen: HashSet::new(),
            buffer: VecDeque::new(),
            cycles: 0,
            finished: false,
        }
    }
}
