//! Learner double that records every call the loop makes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;

use quarry_core::errors::{LearnerError, QuarryResult};
use quarry_core::traits::ActiveLearner;

/// One learner call as the loop made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// Seed row count.
    Initialize(usize),
    /// Requested sample count and the pool size when asked.
    Query { num_samples: usize, pool: usize },
    /// Label count.
    Update(usize),
    Save(PathBuf),
}

/// Queries the lowest pool indices first and refits nothing.
#[derive(Debug, Default, Serialize)]
pub struct RecordingLearner {
    pub pool: BTreeSet<usize>,
    pub labeled: Vec<(usize, usize)>,
    pub pending: Option<Vec<usize>>,
    pub initialized_with: Vec<usize>,
    pub queries: Vec<Vec<usize>>,
    pub updates: Vec<Vec<usize>>,
    #[serde(skip)]
    pub saves: Mutex<Vec<PathBuf>>,
    #[serde(skip)]
    pub calls: Mutex<Vec<Call>>,
}

impl RecordingLearner {
    pub fn with_pool(size: usize) -> Self {
        Self {
            pool: (0..size).collect(),
            ..Self::default()
        }
    }

    /// Paths passed to `save`, in call order.
    pub fn saved_paths(&self) -> Vec<PathBuf> {
        self.saves.lock().unwrap().clone()
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ActiveLearner for RecordingLearner {
    fn initialize(&mut self, indices: &[usize], labels: &[usize]) -> QuarryResult<()> {
        self.log(Call::Initialize(indices.len()));
        if !self.labeled.is_empty() {
            return Err(LearnerError::AlreadyInitialized.into());
        }
        for (&index, &label) in indices.iter().zip(labels) {
            self.pool.remove(&index);
            self.labeled.push((index, label));
        }
        self.initialized_with = indices.to_vec();
        Ok(())
    }

    fn query(&mut self, num_samples: usize) -> QuarryResult<Vec<usize>> {
        self.log(Call::Query {
            num_samples,
            pool: self.pool.len(),
        });
        if self.pool.is_empty() {
            return Err(LearnerError::PoolExhausted.into());
        }
        let picked: Vec<usize> = self.pool.iter().copied().take(num_samples).collect();
        self.pending = Some(picked.clone());
        self.queries.push(picked.clone());
        Ok(picked)
    }

    fn update(&mut self, labels: &[usize]) -> QuarryResult<()> {
        self.log(Call::Update(labels.len()));
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
        for (&index, &label) in pending.iter().zip(labels) {
            self.pool.remove(&index);
            self.labeled.push((index, label));
        }
        self.updates.push(labels.to_vec());
        Ok(())
    }

    fn save(&self, path: &Path) -> QuarryResult<()> {
        std::fs::write(path, serde_json::to_vec(self)?)?;
        self.saves.lock().unwrap().push(path.to_path_buf());
        self.log(Call::Save(path.to_path_buf()));
        Ok(())
    }

    fn pool_len(&self) -> usize {
        self.pool.len()
    }

    fn labeled_len(&self) -> usize {
        self.labeled.len()
    }

    fn batches_completed(&self) -> u64 {
        self.updates.len() as u64
    }
}
