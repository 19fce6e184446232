//! Learner snapshot files.
//!
//! A snapshot is a JSON envelope around the serialized learner state:
//!
//! ```json
//! { "format_version": 1, "dataset_len": 1000, "checksum": "<blake3 hex>", "payload": "<json>" }
//! ```
//!
//! The checksum covers the payload string. Files are written to a sibling
//! `<name>.tmp` and renamed into place, so a crash mid-write never leaves a
//! truncated snapshot at the target path.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use quarry_core::constants::SNAPSHOT_FORMAT_VERSION;
use quarry_core::errors::{LearnerError, QuarryResult};

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEnvelope {
    format_version: u32,
    dataset_len: usize,
    checksum: String,
    payload: String,
}

fn invalid(path: &Path, reason: impl Into<String>) -> LearnerError {
    LearnerError::SnapshotInvalid {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

fn temp_sibling(path: &Path) -> QuarryResult<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| invalid(path, "snapshot path has no file name"))?;
    let mut tmp = name.to_os_string();
    tmp.push(".tmp");
    Ok(path.with_file_name(tmp))
}

/// Serialize `state` and write it atomically to `path`.
pub fn write_snapshot<T: Serialize>(path: &Path, dataset_len: usize, state: &T) -> QuarryResult<()> {
    let payload = serde_json::to_string(state)?;
    let envelope = SnapshotEnvelope {
        format_version: SNAPSHOT_FORMAT_VERSION,
        dataset_len,
        checksum: blake3::hash(payload.as_bytes()).to_hex().to_string(),
        payload,
    };

    let tmp = temp_sibling(path)?;
    std::fs::write(&tmp, serde_json::to_vec(&envelope)?)?;
    std::fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), dataset_len, "snapshot written");
    Ok(())
}

/// Read a snapshot, checking its version, checksum, and dataset length.
pub fn read_snapshot<T: DeserializeOwned>(path: &Path, dataset_len: usize) -> QuarryResult<T> {
    let bytes = std::fs::read(path)?;
    let envelope: SnapshotEnvelope = serde_json::from_slice(&bytes)
        .map_err(|e| invalid(path, format!("unreadable envelope: {e}")))?;

    if envelope.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(invalid(
            path,
            format!(
                "format version {} (expected {SNAPSHOT_FORMAT_VERSION})",
                envelope.format_version
            ),
        )
        .into());
    }
    let checksum = blake3::hash(envelope.payload.as_bytes()).to_hex().to_string();
    if checksum != envelope.checksum {
        return Err(invalid(path, "checksum mismatch").into());
    }
    if envelope.dataset_len != dataset_len {
        return Err(invalid(
            path,
            format!(
                "taken over {} rows, dataset has {dataset_len}",
                envelope.dataset_len
            ),
        )
        .into());
    }
    serde_json::from_str(&envelope.payload)
        .map_err(|e| invalid(path, format!("unreadable payload: {e}")).into())
}
