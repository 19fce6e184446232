//! Query strategies: which pool rows to send for annotation next.

mod breaking_ties;
mod random;

pub use breaking_ties::BreakingTies;
pub use random::RandomSampling;

use serde::{Deserialize, Serialize};

use quarry_core::errors::{LearnerError, QuarryResult};
use quarry_core::models::Dataset;

use crate::classifier::Classifier;

/// Ranks pool rows by informativeness.
pub trait QueryStrategy {
    /// Configuration name, e.g. `"breaking-ties"`.
    fn name(&self) -> &'static str;

    /// Up to `n` distinct rows of `pool`, most informative first.
    fn select(
        &mut self,
        classifier: &dyn Classifier,
        dataset: &Dataset,
        pool: &[usize],
        n: usize,
    ) -> QuarryResult<Vec<usize>>;
}

/// A strategy chosen by name at runtime. Serializable so that its state
/// travels with the learner snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    BreakingTies(BreakingTies),
    Random(RandomSampling),
}

impl Strategy {
    /// Build the strategy named in config. `seed` only matters for `random`;
    /// without one the generator is seeded from entropy.
    pub fn from_name(name: &str, seed: Option<u64>) -> QuarryResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "breaking-ties" | "breaking_ties" => Ok(Self::BreakingTies(BreakingTies)),
            "random" => Ok(Self::Random(RandomSampling::new(
                seed.unwrap_or_else(rand::random),
            ))),
            _ => Err(LearnerError::UnknownStrategy {
                name: name.to_string(),
            }
            .into()),
        }
    }
}

impl QueryStrategy for Strategy {
    fn name(&self) -> &'static str {
        match self {
            Self::BreakingTies(s) => s.name(),
            Self::Random(s) => s.name(),
        }
    }

    fn select(
        &mut self,
        classifier: &dyn Classifier,
        dataset: &Dataset,
        pool: &[usize],
        n: usize,
    ) -> QuarryResult<Vec<usize>> {
        match self {
            Self::BreakingTies(s) => s.select(classifier, dataset, pool, n),
            Self::Random(s) => s.select(classifier, dataset, pool, n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_strategies_by_name() {
        assert_eq!(Strategy::from_name("breaking-ties", None).unwrap().name(), "breaking-ties");
        assert_eq!(Strategy::from_name(" Random ", Some(7)).unwrap().name(), "random");
        assert!(Strategy::from_name("least-confidence", None).is_err());
    }
}
