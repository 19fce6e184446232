//! The active-learning session.
//!
//! Per batch `i`: ask the learner for indices, publish them as pending
//! records tagged `batch_id = i`, block on a unique query stream until every
//! one of them comes back validated, translate the annotations, update the
//! learner, and move on to `i + 1`. Batch `i + 1` is never queried before
//! batch `i` has been folded in.
//!
//! Interruption is cooperative: the cancellation token stops the stream
//! between sleep slices, and the session then saves a learner snapshot and
//! returns [`RunOutcome::Interrupted`]. A partially annotated batch is
//! dropped.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use quarry_core::config::QuarryConfig;
use quarry_core::constants::{INITIAL_COLLECTION_SUFFIX, VALIDATED_BATCH_FILTER};
use quarry_core::errors::{QuarryError, QuarryResult};
use quarry_core::models::Dataset;
use quarry_core::traits::{
    ActiveLearner, AnnotationStore, Cancellable, CancellationToken, Clock, SystemClock,
};
use quarry_learner::stratified_sampling;
use quarry_stream::{Priority, QueryStream};

use crate::labels::align_labels;
use crate::publish::{batch_records, seed_records};
use crate::tracing_setup::events;

/// Session parameters, resolved from [`QuarryConfig`].
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub collection: String,
    pub query_batch_size: usize,
    pub seed_size: usize,
    pub priority: Priority,
    pub refresh_wait: Duration,
    pub snapshot_path: PathBuf,
    /// Stop after this many completed batches (counted across resumes).
    pub max_batches: Option<u64>,
    pub rng_seed: Option<u64>,
}

impl LoopSettings {
    pub fn from_config(config: &QuarryConfig) -> QuarryResult<Self> {
        Ok(Self {
            collection: config.session.collection.clone(),
            query_batch_size: config.learner.query_batch_size,
            seed_size: config.learner.seed_size,
            priority: Priority::from_str(&config.stream.priority)?,
            refresh_wait: Duration::from_millis(config.stream.refresh_wait_ms),
            snapshot_path: PathBuf::from(&config.session.snapshot_path),
            max_batches: config.session.max_batches,
            rng_seed: config.learner.rng_seed,
        })
    }

    /// Collection the seed set is published to.
    pub fn initial_collection(&self) -> String {
        format!("{}{INITIAL_COLLECTION_SUFFIX}", self.collection)
    }
}

/// Why a run ended without being interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxBatches,
    PoolExhausted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxBatches => "max_batches",
            Self::PoolExhausted => "pool_exhausted",
        }
    }
}

/// How [`ActiveLearningLoop::run`] ended. Both variants mean a snapshot was
/// written to `snapshot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Interrupted {
        snapshot: PathBuf,
        batches_completed: u64,
    },
    Completed {
        snapshot: PathBuf,
        batches_completed: u64,
        reason: StopReason,
    },
}

/// Drives an [`ActiveLearner`] against an [`AnnotationStore`].
pub struct ActiveLearningLoop<L> {
    store: Arc<dyn AnnotationStore>,
    learner: L,
    dataset: Arc<Dataset>,
    settings: LoopSettings,
    clock: Arc<dyn Clock>,
    run_id: Uuid,
    resumed: bool,
}

impl<L: ActiveLearner> ActiveLearningLoop<L> {
    pub fn new(
        store: Arc<dyn AnnotationStore>,
        learner: L,
        dataset: Arc<Dataset>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            store,
            learner,
            dataset,
            settings,
            clock: Arc::new(SystemClock),
            run_id: Uuid::new_v4(),
            resumed: false,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The learner was restored from a snapshot: skip seeding and continue
    /// batch numbering from its completed-batch count.
    pub fn resumed(mut self) -> Self {
        self.resumed = true;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn learner(&self) -> &L {
        &self.learner
    }

    pub fn into_learner(self) -> L {
        self.learner
    }

    /// Run until interrupted, out of pool, or at `max_batches`.
    ///
    /// Errors other than cancellation (unknown labels, store failures, bad
    /// records) propagate without writing a snapshot.
    pub fn run(&mut self, token: &CancellationToken) -> QuarryResult<RunOutcome> {
        let span = tracing::info_span!("active_learning_run", run_id = %self.run_id);
        let _guard = span.enter();

        match self.drive(token) {
            Err(e) if e.is_cancelled() => {
                let snapshot = self.save_snapshot()?;
                let batches_completed = self.learner.batches_completed();
                events::run_interrupted(batches_completed);
                Ok(RunOutcome::Interrupted {
                    snapshot,
                    batches_completed,
                })
            }
            other => other,
        }
    }

    fn drive(&mut self, token: &CancellationToken) -> QuarryResult<RunOutcome> {
        if !self.resumed {
            self.seed()?;
        }

        let mut batch_id = self.learner.batches_completed();
        // Captured before anything of this run is published, so a batch
        // validated instantly still falls inside the first window.
        let window_start = self.clock.now();
        let mut stream = QueryStream::builder(
            self.store.clone(),
            self.settings.collection.as_str(),
            VALIDATED_BATCH_FILTER,
        )
        .param("batch_id", batch_id)
        .priority(self.settings.priority)
        .unique(true)
        .refresh_wait(self.settings.refresh_wait)
        .clock(self.clock.clone())
        .cancellation(token.clone())
        .start_from(Some(window_start))
        .build();

        loop {
            if let Some(max) = self.settings.max_batches {
                if self.learner.batches_completed() >= max {
                    return self.complete(StopReason::MaxBatches);
                }
            }
            if token.is_cancelled() {
                return Err(QuarryError::Cancelled);
            }

            let queried = match self.learner.query(self.settings.query_batch_size) {
                Ok(queried) if !queried.is_empty() => queried,
                Ok(_) => return self.complete(StopReason::PoolExhausted),
                Err(e) if e.is_pool_exhausted() => return self.complete(StopReason::PoolExhausted),
                Err(e) => return Err(e),
            };

            let records = batch_records(&self.dataset, batch_id, &queried)?;
            self.store.write(&records, &self.settings.collection)?;
            events::batch_published(batch_id, records.len());

            stream.set_param("batch_id", batch_id);
            let answered = stream.next_batch(queried.len())?;
            let labels = align_labels(batch_id, &queried, &answered, &self.dataset)?;
            self.learner.update(&labels)?;
            events::batch_completed(batch_id, labels.len(), self.learner.pool_len());

            batch_id += 1;
        }
    }

    /// Pick the stratified seed, fit the learner on it, and publish it.
    fn seed(&mut self) -> QuarryResult<()> {
        let mut rng = match self.settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let indices = stratified_sampling(self.dataset.labels(), self.settings.seed_size, &mut rng);
        if indices.is_empty() {
            return Err(QuarryError::InvalidDataset {
                reason: "no labeled rows to seed the learner with".to_string(),
            });
        }
        let labels = indices
            .iter()
            .map(|&index| {
                self.dataset
                    .label(index)
                    .ok_or_else(|| QuarryError::InvalidDataset {
                        reason: format!("seed row {index} has no label"),
                    })
            })
            .collect::<QuarryResult<Vec<_>>>()?;

        self.learner.initialize(&indices, &labels)?;

        let collection = self.settings.initial_collection();
        let records = seed_records(&self.dataset, &indices, &labels)?;
        self.store.write(&records, &collection)?;
        events::seed_published(&collection, records.len());
        Ok(())
    }

    fn complete(&self, reason: StopReason) -> QuarryResult<RunOutcome> {
        let snapshot = self.save_snapshot()?;
        let batches_completed = self.learner.batches_completed();
        events::run_completed(batches_completed, reason.as_str());
        Ok(RunOutcome::Completed {
            snapshot,
            batches_completed,
            reason,
        })
    }

    fn save_snapshot(&self) -> QuarryResult<PathBuf> {
        let path: &Path = &self.settings.snapshot_path;
        self.learner.save(path)?;
        events::snapshot_saved(path, self.learner.batches_completed());
        Ok(path.to_path_buf())
    }
}
