//! In-memory dataset: immutable feature rows, texts, and the known labels.

use crate::errors::{QuarryError, QuarryResult};

/// Feature matrix paired with texts and (possibly unknown) labels.
///
/// Rows are addressed by their position. The feature matrix never changes
/// after construction; labels are only read here, the learner keeps its own
/// record of what has been annotated.
#[derive(Debug, Clone)]
pub struct Dataset {
    texts: Vec<String>,
    features: Vec<Vec<f32>>,
    labels: Vec<Option<usize>>,
    label_names: Vec<String>,
}

impl Dataset {
    pub fn new(
        texts: Vec<String>,
        features: Vec<Vec<f32>>,
        labels: Vec<Option<usize>>,
        label_names: Vec<String>,
    ) -> QuarryResult<Self> {
        if texts.len() != features.len() || texts.len() != labels.len() {
            return Err(QuarryError::InvalidDataset {
                reason: format!(
                    "row count mismatch: {} texts, {} feature rows, {} labels",
                    texts.len(),
                    features.len(),
                    labels.len()
                ),
            });
        }
        if label_names.is_empty() {
            return Err(QuarryError::InvalidDataset {
                reason: "at least one class name is required".to_string(),
            });
        }
        if let Some(first) = features.first() {
            let dims = first.len();
            if let Some(row) = features.iter().position(|f| f.len() != dims) {
                return Err(QuarryError::InvalidDataset {
                    reason: format!(
                        "row {row} has {} features, expected {dims}",
                        features[row].len()
                    ),
                });
            }
        }
        if let Some((row, label)) = labels
            .iter()
            .enumerate()
            .find_map(|(i, l)| l.filter(|l| *l >= label_names.len()).map(|l| (i, l)))
        {
            return Err(QuarryError::InvalidDataset {
                reason: format!(
                    "row {row} has label {label}, only {} classes exist",
                    label_names.len()
                ),
            });
        }

        Ok(Self {
            texts,
            features,
            labels,
            label_names,
        })
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.texts.get(index).map(String::as_str)
    }

    pub fn features(&self, index: usize) -> Option<&[f32]> {
        self.features.get(index).map(Vec::as_slice)
    }

    /// Width of the feature rows (0 for an empty dataset).
    pub fn dimensions(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    pub fn label(&self, index: usize) -> Option<usize> {
        self.labels.get(index).copied().flatten()
    }

    pub fn labels(&self) -> &[Option<usize>] {
        &self.labels
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    pub fn num_classes(&self) -> usize {
        self.label_names.len()
    }

    /// Class index for a class name.
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.label_names.iter().position(|n| n == name)
    }
}
