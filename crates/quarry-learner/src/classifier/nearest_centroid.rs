use serde::{Deserialize, Serialize};

use quarry_core::errors::{LearnerError, QuarryResult};
use quarry_core::models::Dataset;

use super::Classifier;

/// Cosine nearest-centroid classifier with softmax confidences.
///
/// Each class is represented by the L2-normalised mean of its labeled rows.
/// Scores are `softmax(temperature * cosine)`; a class with no labeled rows
/// gets probability 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestCentroid {
    num_classes: usize,
    temperature: f64,
    centroids: Vec<Option<Vec<f32>>>,
}

impl NearestCentroid {
    pub fn new(num_classes: usize, temperature: f64) -> Self {
        Self {
            num_classes,
            temperature,
            centroids: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.centroids.iter().any(Option::is_some)
    }

    pub fn centroid(&self, class: usize) -> Option<&[f32]> {
        self.centroids.get(class).and_then(|c| c.as_deref())
    }
}

impl Classifier for NearestCentroid {
    fn fit(&mut self, dataset: &Dataset, indices: &[usize], labels: &[usize]) -> QuarryResult<()> {
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

        let dims = dataset.dimensions();
        let mut sums = vec![vec![0.0f32; dims]; self.num_classes];
        let mut counts = vec![0usize; self.num_classes];
        for (&index, &label) in indices.iter().zip(labels) {
            if label >= self.num_classes {
                return Err(LearnerError::LabelOutOfRange {
                    label,
                    num_classes: self.num_classes,
                }
                .into());
            }
            let row = dataset.features(index).ok_or(LearnerError::IndexOutOfRange {
                index,
                len: dataset.len(),
            })?;
            for (acc, value) in sums[label].iter_mut().zip(row) {
                *acc += value;
            }
            counts[label] += 1;
        }

        self.centroids = sums
            .into_iter()
            .zip(counts)
            .map(|(mut sum, count)| {
                if count == 0 {
                    return None;
                }
                normalize(&mut sum);
                Some(sum)
            })
            .collect();
        Ok(())
    }

    fn predict_proba(&self, features: &[f32]) -> QuarryResult<Vec<f64>> {
        if !self.is_fitted() {
            return Err(LearnerError::NotInitialized.into());
        }
        let norm = l2_norm(features);
        let logits: Vec<Option<f64>> = self
            .centroids
            .iter()
            .map(|centroid| {
                centroid.as_ref().map(|c| {
                    let dot: f32 = c.iter().zip(features).map(|(a, b)| a * b).sum();
                    let cosine = if norm > 0.0 { f64::from(dot / norm) } else { 0.0 };
                    self.temperature * cosine
                })
            })
            .collect();

        let max = logits
            .iter()
            .flatten()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits
            .iter()
            .map(|l| l.map_or(0.0, |l| (l - max).exp()))
            .collect();
        let total: f64 = exps.iter().sum();
        Ok(exps.into_iter().map(|e| e / total).collect())
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}

fn l2_norm(values: &[f32]) -> f32 {
    values.iter().map(|v| v * v).sum::<f32>().sqrt()
}

fn normalize(values: &mut [f32]) {
    let norm = l2_norm(values);
    if norm > 0.0 {
        values.iter_mut().for_each(|v| *v /= norm);
    }
}
