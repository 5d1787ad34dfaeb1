//! CartesianRun: resumable sweep over a list of node pairs

use super::node_pair::{log_failure, NodePairChatroom};
use super::ChatroomResult;
use crate::cancel::CancellationToken;
use crate::store::{ProgressStore, RunStatus};
use tracing::{info, warn};

/// Default number of processed pairs between checkpoints
pub const DEFAULT_CHECKPOINT_EVERY: usize = 10;

/// What one invocation of a run did
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub status: RunStatus,
    /// Pairs discussed by this invocation, failures included
    pub processed: usize,
    /// Pairs skipped because an earlier run completed them
    pub skipped: usize,
    /// Pairs whose processing errored; left for the next run
    pub failed: usize,
    /// Edges accepted by this invocation
    pub accepted: usize,
    /// Edges accepted over the whole run, earlier invocations included
    pub total_valid: usize,
    pub total_pairs: usize,
}

/// Drives a chatroom over many pairs, checkpointing to a progress file
///
/// Completed pairs are skipped by membership in the progress file, so the
/// pair list may be regenerated between invocations. A pair that errors is
/// not marked completed and is retried by the next invocation.
pub struct CartesianRun<'a> {
    chatroom: &'a NodePairChatroom,
    progress: ProgressStore,
    depth: usize,
    checkpoint_every: usize,
    cancel: CancellationToken,
}

impl<'a> CartesianRun<'a> {
    pub fn new(chatroom: &'a NodePairChatroom, progress: ProgressStore) -> Self {
        Self {
            chatroom,
            progress,
            depth: 1,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Checkpoint after this many processed pairs (at least one).
    pub fn with_checkpoint_every(mut self, every: usize) -> Self {
        self.checkpoint_every = every.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Process every pair not yet completed.
    ///
    /// Per-pair failures are logged and counted; only progress-file errors
    /// end the run early.
    pub async fn run(&self, pairs: &[(String, String)]) -> ChatroomResult<RunReport> {
        let mut progress = self.progress.load()?;
        let mut completed = progress.completed_set();
        let total_pairs = pairs.len();

        progress.total_pairs = total_pairs;
        progress.status = None;

        let mut report = RunReport {
            status: RunStatus::Completed,
            processed: 0,
            skipped: 0,
            failed: 0,
            accepted: 0,
            total_valid: progress.total_valid,
            total_pairs,
        };

        if !completed.is_empty() {
            info!(
                completed = completed.len(),
                total_valid = progress.total_valid,
                "resuming from progress file"
            );
        }

        let mut since_checkpoint = 0;
        for (i, (source_id, target_id)) in pairs.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(at = i, "run cancelled, saving progress");
                self.progress.save(&mut progress)?;
                report.status = RunStatus::Interrupted;
                report.total_valid = progress.total_valid;
                return Ok(report);
            }

            let key = (source_id.clone(), target_id.clone());
            if completed.contains(&key) {
                report.skipped += 1;
                continue;
            }

            info!(
                pair = i + 1,
                total = total_pairs,
                valid = progress.total_valid,
                "cartesian progress"
            );

            match self
                .chatroom
                .discuss_pair(source_id, target_id, self.depth)
                .await
            {
                Ok(outcome) => {
                    if outcome.is_accepted() {
                        progress.total_valid += 1;
                        report.accepted += 1;
                    }
                    progress.completed_pairs.push(key.clone());
                    completed.insert(key);
                }
                Err(e) => {
                    log_failure(source_id, target_id, &e);
                    report.failed += 1;
                }
            }

            report.processed += 1;
            progress.last_index = i;
            progress.progress_percentage = percent(i + 1, total_pairs);

            since_checkpoint += 1;
            if since_checkpoint >= self.checkpoint_every {
                self.progress.save(&mut progress)?;
                since_checkpoint = 0;
            }
        }

        progress.status = Some(RunStatus::Completed);
        progress.progress_percentage = 100.0;
        self.progress.save(&mut progress)?;

        report.total_valid = progress.total_valid;
        info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            total_valid = report.total_valid,
            "cartesian run completed"
        );
        Ok(report)
    }
}

fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}
