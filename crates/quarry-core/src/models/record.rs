//! Annotation records: the unit exchanged with the annotation store.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{METADATA_BATCH_ID, METADATA_DATASET_INDEX};
use crate::errors::QuarryError;

/// Record identity, unique within a collection. Integers and strings are
/// both accepted on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(v) => write!(f, "{v}"),
            RecordId::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId::Text(value)
    }
}

/// Annotation lifecycle. `Validated` is the only terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordStatus {
    /// Queried, waiting for a human.
    #[default]
    Pending,
    /// Touched by an annotator but not confirmed.
    Edited,
    /// Confirmed by a human.
    Validated,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "Pending",
            RecordStatus::Edited => "Edited",
            RecordStatus::Validated => "Validated",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordStatus::Validated)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            // "default" is what annotation UIs report for untouched records.
            "pending" | "default" => Ok(RecordStatus::Pending),
            "edited" => Ok(RecordStatus::Edited),
            "validated" => Ok(RecordStatus::Validated),
            _ => Err(QuarryError::InvalidArgument {
                reason: format!("unknown record status: {s}"),
            }),
        }
    }
}

impl TryFrom<String> for RecordStatus {
    type Error = QuarryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordStatus> for String {
    fn from(value: RecordStatus) -> Self {
        value.as_str().to_string()
    }
}

/// One sample sent to, or read back from, the annotation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub id: RecordId,
    pub text: String,
    /// Human-assigned class name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    /// Informational per-class scores, in class order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Vec<(String, f64)>>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Stamped by the store on every write or mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl AnnotationRecord {
    pub fn new(id: impl Into<RecordId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            annotation: None,
            prediction: None,
            status: RecordStatus::Pending,
            metadata: BTreeMap::new(),
            last_updated: None,
        }
    }

    pub fn with_annotation(mut self, label: impl Into<String>) -> Self {
        self.annotation = Some(label.into());
        self
    }

    pub fn with_prediction(mut self, prediction: Vec<(String, f64)>) -> Self {
        self.prediction = Some(prediction);
        self
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Batch generation this record was queried in, if tagged.
    pub fn batch_id(&self) -> Option<u64> {
        self.metadata.get(METADATA_BATCH_ID).and_then(|v| v.as_u64())
    }

    /// Dataset row this record was built from, if tagged.
    pub fn dataset_index(&self) -> Option<usize> {
        self.metadata
            .get(METADATA_DATASET_INDEX)
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
    }

    pub fn is_validated(&self) -> bool {
        self.status.is_terminal()
    }
}
