//! ProgressStore: checkpoint file of a resumable cross-product run

use super::{read_json, timestamp, write_json_atomic, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Interrupted,
}

/// Checkpointed state of a run
///
/// `completed_pairs` holds `(source_id, target_id)` pairs and serializes as
/// two-element arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub completed_pairs: Vec<(String, String)>,
    #[serde(default)]
    pub last_index: usize,
    #[serde(default)]
    pub total_valid: usize,
    #[serde(default)]
    pub total_pairs: usize,
    #[serde(default)]
    pub progress_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Progress {
    /// Completed pairs as a lookup set.
    pub fn completed_set(&self) -> HashSet<(String, String)> {
        self.completed_pairs.iter().cloned().collect()
    }

    pub fn is_completed(&self) -> bool {
        self.status == Some(RunStatus::Completed)
    }
}

/// Reads and writes the progress file
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved progress, or a fresh record when no file exists.
    pub fn load(&self) -> StoreResult<Progress> {
        if !self.path.exists() {
            return Ok(Progress::default());
        }
        read_json(&self.path)
    }

    /// Stamp `last_updated` and write the record.
    pub fn save(&self, progress: &mut Progress) -> StoreResult<()> {
        progress.last_updated = Some(Utc::now());
        write_json_atomic(&self.path, progress)
    }
}
