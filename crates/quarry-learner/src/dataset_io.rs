//! JSON-lines dataset loader.
//!
//! One object per line: `{"text": "...", "label": "LOC"}`. `label` may be
//! missing or null for rows whose class is unknown. Blank lines are skipped.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use quarry_core::errors::{QuarryError, QuarryResult};
use quarry_core::models::Dataset;

use crate::vectorize::HashingVectorizer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub text: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Read a JSONL file and vectorize it.
///
/// Class names are taken from `label_names` when given (a label outside that
/// list is an error), otherwise they are the sorted distinct labels in the
/// file.
pub fn load_jsonl(
    path: &Path,
    vectorizer: &HashingVectorizer,
    label_names: Option<Vec<String>>,
) -> QuarryResult<Dataset> {
    let content = std::fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row: DatasetRow = serde_json::from_str(line).map_err(|e| QuarryError::InvalidDataset {
            reason: format!("{}:{}: {e}", path.display(), line_no + 1),
        })?;
        rows.push(row);
    }
    from_rows(rows, vectorizer, label_names)
}

/// Build a dataset from parsed rows.
pub fn from_rows(
    rows: Vec<DatasetRow>,
    vectorizer: &HashingVectorizer,
    label_names: Option<Vec<String>>,
) -> QuarryResult<Dataset> {
    let names = match label_names {
        Some(names) => names,
        None => rows
            .iter()
            .filter_map(|r| r.label.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    };

    let mut labels = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let label = match &row.label {
            None => None,
            Some(name) => Some(names.iter().position(|n| n == name).ok_or_else(|| {
                QuarryError::InvalidDataset {
                    reason: format!("row {i}: unknown label `{name}`"),
                }
            })?),
        };
        labels.push(label);
    }

    let features = vectorizer.transform_all(rows.iter().map(|r| r.text.as_str()));
    let texts = rows.into_iter().map(|r| r.text).collect();
    tracing::debug!(
        rows = labels.len(),
        classes = names.len(),
        dimensions = vectorizer.dimensions(),
        "dataset loaded"
    );
    Dataset::new(texts, features, labels, names)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_labels_and_discovers_class_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for (text, label) in test_fixtures::question_dataset() {
            writeln!(file, "{}", serde_json::json!({"text": text, "label": label})).unwrap();
        }
        writeln!(file).unwrap();
        writeln!(file, r#"{{"text": "What is a dingbat ?"}}"#).unwrap();

        let dataset = load_jsonl(file.path(), &HashingVectorizer::new(128), None).unwrap();
        assert_eq!(dataset.len(), 13);
        assert_eq!(dataset.label_names(), test_fixtures::QUESTION_LABELS);
        assert_eq!(dataset.label(9), dataset.label_index("LOC"));
        assert_eq!(dataset.label(12), None);
        assert_eq!(dataset.dimensions(), 128);
    }

    #[test]
    fn malformed_line_reports_its_position() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"text": "ok", "label": "HUM"}}"#).unwrap();
        writeln!(file, "not json").unwrap();
        let err = load_jsonl(file.path(), &HashingVectorizer::new(8), None).unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }

    #[test]
    fn fixed_class_list_rejects_strangers() {
        let rows = vec![DatasetRow {
            text: "Who was Galileo ?".into(),
            label: Some("PERSON".into()),
        }];
        let names = Some(vec!["HUM".to_string()]);
        assert!(from_rows(rows, &HashingVectorizer::new(8), names).is_err());
    }
}
