//! Pool-based active learner.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use quarry_core::errors::{LearnerError, QuarryResult};
use quarry_core::models::Dataset;
use quarry_core::traits::ActiveLearner;

use crate::classifier::Classifier;
use crate::snapshot::{read_snapshot, write_snapshot};
use crate::strategy::QueryStrategy;

/// Owns the unlabeled pool, the labeled set, the classifier, and the query
/// strategy.
///
/// The pool only ever shrinks. Every index handed out by `query` is in the
/// pool at that moment and leaves it when `update` labels it.
#[derive(Debug)]
pub struct PoolBasedActiveLearner<C, S> {
    dataset: Arc<Dataset>,
    classifier: C,
    strategy: S,
    pool: BTreeSet<usize>,
    labeled: Vec<(usize, usize)>,
    pending: Option<Vec<usize>>,
    batches: u64,
}

/// Persisted learner state. The outstanding query is not part of it; a
/// resumed learner starts with a fresh query.
#[derive(Serialize, Deserialize)]
struct LearnerState<C, S> {
    pool: BTreeSet<usize>,
    labeled: Vec<(usize, usize)>,
    batches: u64,
    classifier: C,
    strategy: S,
}

impl<C: Classifier, S: QueryStrategy> PoolBasedActiveLearner<C, S> {
    /// A learner over `dataset` with every row in the pool.
    pub fn new(dataset: Arc<Dataset>, classifier: C, strategy: S) -> Self {
        let pool = (0..dataset.len()).collect();
        Self {
            dataset,
            classifier,
            strategy,
            pool,
            labeled: Vec::new(),
            pending: None,
            batches: 0,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Pool indices in ascending order.
    pub fn pool(&self) -> &BTreeSet<usize> {
        &self.pool
    }

    /// `(index, class)` pairs in labeling order, seed first.
    pub fn labeled(&self) -> &[(usize, usize)] {
        &self.labeled
    }

    /// The outstanding query, if one is waiting for labels.
    pub fn pending_query(&self) -> Option<&[usize]> {
        self.pending.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        !self.labeled.is_empty()
    }

    fn check_labels(&self, labels: &[usize]) -> QuarryResult<()> {
        let num_classes = self.dataset.num_classes();
        if let Some(&label) = labels.iter().find(|&&l| l >= num_classes) {
            return Err(LearnerError::LabelOutOfRange { label, num_classes }.into());
        }
        Ok(())
    }

    fn refit(&mut self) -> QuarryResult<()> {
        let (indices, labels): (Vec<usize>, Vec<usize>) = self.labeled.iter().copied().unzip();
        self.classifier.fit(&self.dataset, &indices, &labels)
    }
}

impl<C, S> PoolBasedActiveLearner<C, S>
where
    C: Classifier + DeserializeOwned,
    S: QueryStrategy + DeserializeOwned,
{
    /// Restore a learner saved with [`ActiveLearner::save`].
    ///
    /// The snapshot must have been taken over a dataset of the same length.
    pub fn load(path: &Path, dataset: Arc<Dataset>) -> QuarryResult<Self> {
        let state: LearnerState<C, S> = read_snapshot(path, dataset.len())?;

        let len = dataset.len();
        let mut seen = HashSet::new();
        for &index in state.pool.iter().chain(state.labeled.iter().map(|(i, _)| i)) {
            if index >= len {
                return Err(LearnerError::IndexOutOfRange { index, len }.into());
            }
            if !seen.insert(index) {
                return Err(LearnerError::SnapshotInvalid {
                    path: path.display().to_string(),
                    reason: format!("row {index} is both pooled and labeled"),
                }
                .into());
            }
        }

        tracing::info!(
            event = "learner_restored",
            path = %path.display(),
            pool = state.pool.len(),
            labeled = state.labeled.len(),
            batches = state.batches,
        );
        Ok(Self {
            dataset,
            classifier: state.classifier,
            strategy: state.strategy,
            pool: state.pool,
            labeled: state.labeled,
            pending: None,
            batches: state.batches,
        })
    }
}

impl<C, S> ActiveLearner for PoolBasedActiveLearner<C, S>
where
    C: Classifier + Serialize,
    S: QueryStrategy + Serialize,
{
    fn initialize(&mut self, indices: &[usize], labels: &[usize]) -> QuarryResult<()> {
        if self.is_initialized() {
            return Err(LearnerError::AlreadyInitialized.into());
        }
        if indices.len() != labels.len() {
            return Err(LearnerError::LabelCountMismatch {
                expected: indices.len(),
                actual: labels.len(),
            }
            .into());
        }
        if indices.is_empty() {
            return Err(LearnerError::EmptyPopulation.into());
        }
        let len = self.dataset.len();
        let mut distinct = HashSet::with_capacity(indices.len());
        for &index in indices {
            if index >= len {
                return Err(LearnerError::IndexOutOfRange { index, len }.into());
            }
            if !distinct.insert(index) {
                return Err(LearnerError::DuplicateIndex { index }.into());
            }
        }
        self.check_labels(labels)?;

        for (&index, &label) in indices.iter().zip(labels) {
            self.pool.remove(&index);
            self.labeled.push((index, label));
        }
        self.refit()?;
        tracing::info!(
            event = "learner_initialized",
            seed = indices.len(),
            pool = self.pool.len(),
        );
        Ok(())
    }

    fn query(&mut self, num_samples: usize) -> QuarryResult<Vec<usize>> {
        if !self.is_initialized() {
            return Err(LearnerError::NotInitialized.into());
        }
        if self.pool.is_empty() {
            return Err(LearnerError::PoolExhausted.into());
        }
        let pool: Vec<usize> = self.pool.iter().copied().collect();
        let picked = self
            .strategy
            .select(&self.classifier, &self.dataset, &pool, num_samples)?;
        if self.pending.is_some() {
            tracing::debug!("replacing unanswered query");
        }
        self.pending = Some(picked.clone());
        Ok(picked)
    }

    fn update(&mut self, labels: &[usize]) -> QuarryResult<()> {
        let pending = self.pending.take().ok_or(LearnerError::NoPendingQuery)?;
        if pending.len() != labels.len() {
            let expected = pending.len();
            self.pending = Some(pending);
            return Err(LearnerError::LabelCountMismatch {
                expected,
                actual: labels.len(),
            }
            .into());
        }
        if let Err(e) = self.check_labels(labels) {
            self.pending = Some(pending);
            return Err(e);
        }

        for (&index, &label) in pending.iter().zip(labels) {
            self.pool.remove(&index);
            self.labeled.push((index, label));
        }
        self.refit()?;
        self.batches += 1;
        Ok(())
    }

    fn save(&self, path: &Path) -> QuarryResult<()> {
        let state = LearnerState {
            pool: self.pool.clone(),
            labeled: self.labeled.clone(),
            batches: self.batches,
            classifier: &self.classifier,
            strategy: &self.strategy,
        };
        write_snapshot(path, self.dataset.len(), &state)
    }

    fn pool_len(&self) -> usize {
        self.pool.len()
    }

    fn labeled_len(&self) -> usize {
        self.labeled.len()
    }

    fn batches_completed(&self) -> u64 {
        self.batches
    }
}
