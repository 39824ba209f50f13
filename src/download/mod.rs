//! Download pipeline: fetch, write, tag, and batch execution

use std::path::PathBuf;

use thiserror::Error;

pub mod batch;
pub mod fetch;
pub mod tagger;
pub mod track;

pub use batch::{ensure_dir, BatchDownloader, BatchEvent, BatchSummary, DirState};
pub use fetch::{CoverArt, Fetcher};
pub use tagger::{TagDefaults, TrackTags};
pub use track::{SkipReason, TrackDownloader, TrackOutcome};

/// Failure to retrieve a remote asset
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed")]
    Request(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(reqwest::StatusCode),

    #[error("expected audio but received {0}")]
    UnexpectedContent(String),

    #[error("cancelled")]
    Cancelled,
}

/// Failure that stops a track download and the batch around it
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to tag {}", path.display())]
    Tag {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },

    #[error("tagging task failed")]
    Task(#[from] tokio::task::JoinError),

    #[error("download cancelled")]
    Cancelled,
}
