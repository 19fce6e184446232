use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use quarry_core::errors::QuarryResult;
use quarry_core::models::Dataset;

use super::QueryStrategy;
use crate::classifier::Classifier;

/// Uniform sampling without replacement. Each draw reseeds from
/// `seed + draws`, so the sequence survives a snapshot round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomSampling {
    seed: u64,
    draws: u64,
}

impl RandomSampling {
    pub fn new(seed: u64) -> Self {
        Self { seed, draws: 0 }
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl QueryStrategy for RandomSampling {
    fn name(&self) -> &'static str {
        "random"
    }

    fn select(
        &mut self,
        _classifier: &dyn Classifier,
        _dataset: &Dataset,
        pool: &[usize],
        n: usize,
    ) -> QuarryResult<Vec<usize>> {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.draws));
        self.draws += 1;
        Ok(pool.choose_multiple(&mut rng, n).copied().collect())
    }
}
