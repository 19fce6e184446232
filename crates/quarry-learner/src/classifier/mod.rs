//! Probabilistic classifiers the learner refits after each batch.

mod nearest_centroid;

pub use nearest_centroid::NearestCentroid;

use quarry_core::errors::QuarryResult;
use quarry_core::models::Dataset;

/// A classifier producing a probability per class.
pub trait Classifier {
    /// Refit from scratch on the given dataset rows and class indices.
    fn fit(&mut self, dataset: &Dataset, indices: &[usize], labels: &[usize]) -> QuarryResult<()>;

    /// Class probabilities for one feature row. Sums to 1.
    fn predict_proba(&self, features: &[f32]) -> QuarryResult<Vec<f64>>;

    fn num_classes(&self) -> usize;
}
