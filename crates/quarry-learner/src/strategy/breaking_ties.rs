use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use quarry_core::errors::{LearnerError, QuarryResult};
use quarry_core::models::Dataset;

use super::QueryStrategy;
use crate::classifier::Classifier;

/// Margin sampling: rows whose two most probable classes are closest.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BreakingTies;

/// Difference between the largest and second-largest probability.
pub(crate) fn margin(proba: &[f64]) -> f64 {
    let mut top = f64::NEG_INFINITY;
    let mut second = f64::NEG_INFINITY;
    for &p in proba {
        if p > top {
            second = top;
            top = p;
        } else if p > second {
            second = p;
        }
    }
    if second.is_finite() {
        top - second
    } else {
        top
    }
}

impl QueryStrategy for BreakingTies {
    fn name(&self) -> &'static str {
        "breaking-ties"
    }

    fn select(
        &mut self,
        classifier: &dyn Classifier,
        dataset: &Dataset,
        pool: &[usize],
        n: usize,
    ) -> QuarryResult<Vec<usize>> {
        let mut scored = Vec::with_capacity(pool.len());
        for &index in pool {
            let features = dataset.features(index).ok_or(LearnerError::IndexOutOfRange {
                index,
                len: dataset.len(),
            })?;
            scored.push((margin(&classifier.predict_proba(features)?), index));
        }
        // Smallest margin first; ties broken by row index for determinism.
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal).then(a.1.cmp(&b.1)));
        Ok(scored.into_iter().take(n).map(|(_, index)| index).collect())
    }
}
