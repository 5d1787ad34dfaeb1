//! File-backed persistence: accepted edges and run progress
//!
//! Both files are rewritten whole on every update. Writes go to a sibling
//! temporary file that is then renamed over the target, so a crash leaves
//! either the old or the new document on disk. Updates are read-modify-write
//! and assume a single writer.

mod edges;
mod progress;
mod timestamp;

pub use edges::{EdgeDocument, EdgeMetadata, EdgeStore};
pub use progress::{Progress, ProgressStore, RunStatus};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Result type for persistence operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Read and decode a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Pretty-print `value` to `path` through a temporary sibling and a rename.
///
/// Parent directories are created as needed.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let file_name = path.file_name().ok_or_else(|| StoreError::Malformed {
        path: path.to_path_buf(),
        reason: "path has no file name".to_string(),
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(&tmp_path, text)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
