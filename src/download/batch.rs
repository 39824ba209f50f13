//! Executing a download plan on a background task

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::fs;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::track::{SkipReason, TrackDownloader, TrackOutcome};
use super::DownloadError;
use crate::library::Step;

/// Progress updates sent while a plan runs
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started { total_steps: u64 },
    /// About to work on the named directory or track
    Retrieving { label: String },
    DirectoryReady { path: PathBuf, state: DirState },
    TrackWritten { title: String, path: PathBuf },
    TrackSkipped { title: String, reason: SkipReason },
    StepCompleted { completed: u64, total: u64 },
    Finished(BatchSummary),
    Cancelled(BatchSummary),
}

/// Totals for a finished (or cancelled) batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub steps_completed: u64,
    pub directories_created: usize,
    pub tracks_written: usize,
    pub tracks_skipped: usize,
    pub bytes_written: u64,
    pub cancelled: bool,
}

/// Whether a directory step created the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirState {
    Created,
    Existing,
}

/// Create `path` (and parents) unless it already is a directory
///
/// Anything other than an existing directory, including a file of the same
/// name or a permission problem, is returned as an error.
pub async fn ensure_dir(path: &Path) -> io::Result<DirState> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => return Ok(DirState::Existing),
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists and is not a directory", path.display()),
            ));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    fs::create_dir_all(path).await?;
    Ok(DirState::Created)
}

/// Runs download plans step by step, reporting progress over a channel
pub struct BatchDownloader {
    downloader: TrackDownloader,
}

impl BatchDownloader {
    pub fn new(downloader: TrackDownloader) -> Self {
        Self { downloader }
    }

    /// Run `steps` on a tokio task
    pub fn spawn(
        self: Arc<Self>,
        steps: Vec<Step>,
        progress: mpsc::Sender<BatchEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<Result<BatchSummary>> {
        tokio::spawn(async move { self.run(steps, progress, cancel).await })
    }

    /// Execute every step in order
    ///
    /// The token is checked before each step and while audio is streaming.
    /// Directory, file-write and tagging errors abort the batch; per-track
    /// download problems are reported and skipped.
    pub async fn run(
        &self,
        steps: Vec<Step>,
        progress: mpsc::Sender<BatchEvent>,
        cancel: CancellationToken,
    ) -> Result<BatchSummary> {
        let total = steps.len() as u64;
        let mut summary = BatchSummary::default();
        let _ = progress.send(BatchEvent::Started { total_steps: total }).await;

        for step in steps {
            if cancel.is_cancelled() {
                return Ok(cancelled(summary, &progress).await);
            }

            let _ = progress
                .send(BatchEvent::Retrieving {
                    label: step.label().to_string(),
                })
                .await;

            match step {
                Step::Directory { path, .. } => {
                    let state = ensure_dir(&path)
                        .await
                        .with_context(|| format!("Failed to create directory {}", path.display()))?;
                    match state {
                        DirState::Created => {
                            summary.directories_created += 1;
                            debug!("Created directory {}", path.display());
                        }
                        DirState::Existing => {
                            debug!("Directory {} already exists, skipping creation", path.display());
                        }
                    }
                    let _ = progress.send(BatchEvent::DirectoryReady { path, state }).await;
                }
                Step::Track { record, dir } => {
                    match self.downloader.download(&record, &dir, &cancel).await {
                        Ok(TrackOutcome::Written { path, bytes }) => {
                            summary.tracks_written += 1;
                            summary.bytes_written += bytes;
                            let _ = progress
                                .send(BatchEvent::TrackWritten {
                                    title: record.title().to_string(),
                                    path,
                                })
                                .await;
                        }
                        Ok(TrackOutcome::Skipped(reason)) => {
                            summary.tracks_skipped += 1;
                            let _ = progress
                                .send(BatchEvent::TrackSkipped {
                                    title: record.title().to_string(),
                                    reason,
                                })
                                .await;
                        }
                        Err(DownloadError::Cancelled) => {
                            return Ok(cancelled(summary, &progress).await);
                        }
                        Err(e) => {
                            return Err(e).with_context(|| format!("Failed to save {}", record.title()));
                        }
                    }
                }
            }

            summary.steps_completed += 1;
            let _ = progress
                .send(BatchEvent::StepCompleted {
                    completed: summary.steps_completed,
                    total,
                })
                .await;
        }

        info!(
            "Batch finished: {} written, {} skipped",
            summary.tracks_written, summary.tracks_skipped
        );
        let _ = progress.send(BatchEvent::Finished(summary.clone())).await;
        Ok(summary)
    }
}

async fn cancelled(mut summary: BatchSummary, progress: &mpsc::Sender<BatchEvent>) -> BatchSummary {
    warn!("Download cancelled after {} steps", summary.steps_completed);
    summary.cancelled = true;
    let _ = progress.send(BatchEvent::Cancelled(summary.clone())).await;
    summary
}
