//! Downloading and tagging a single track

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::fetch::Fetcher;
use super::tagger::{write_tags, TagDefaults, TrackTags};
use super::{DownloadError, FetchError};
use crate::library::{IdentifierKind, TrackRecord};
use crate::service::AccountService;
use crate::utils::format_filename;

/// Why a track was skipped without failing the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingIdentifier,
    StreamUnavailable(String),
    FetchFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingIdentifier => write!(f, "no track identifier"),
            SkipReason::StreamUnavailable(e) => write!(f, "no stream URL: {}", e),
            SkipReason::FetchFailed(e) => write!(f, "download failed: {}", e),
        }
    }
}

/// Result of downloading one track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    Written { path: PathBuf, bytes: u64 },
    Skipped(SkipReason),
}

/// Resolves, downloads, writes and tags individual tracks
pub struct TrackDownloader {
    service: Arc<dyn AccountService>,
    fetcher: Fetcher,
    defaults: TagDefaults,
}

impl TrackDownloader {
    pub fn new(service: Arc<dyn AccountService>, fetcher: Fetcher, defaults: TagDefaults) -> Self {
        Self {
            service,
            fetcher,
            defaults,
        }
    }

    /// Download `track` into `dir` as a tagged MP3
    ///
    /// Missing identifiers and network failures skip the track. Failing to
    /// write or tag the file is an error; a file written before a tagging
    /// failure is left in place.
    pub async fn download(
        &self,
        track: &TrackRecord,
        dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<TrackOutcome, DownloadError> {
        let Some(identifier) = track.identifier() else {
            warn!("Problem with track info, no identifier: {:?}", track);
            return Ok(TrackOutcome::Skipped(SkipReason::MissingIdentifier));
        };

        let stream_url = match identifier.kind {
            IdentifierKind::Episode => self.service.episode_stream_url(&identifier.value).await,
            IdentifierKind::Song => self.service.stream_url(&identifier.value).await,
        };
        let stream_url = match stream_url {
            Ok(url) => url,
            Err(e) => {
                warn!("Error retrieving track {}: {:#}", track.title(), e);
                return Ok(TrackOutcome::Skipped(SkipReason::StreamUnavailable(format!("{:#}", e))));
            }
        };

        let audio = match self.fetcher.fetch_audio(&stream_url, cancel).await {
            Ok(audio) => audio,
            Err(FetchError::Cancelled) => return Err(DownloadError::Cancelled),
            Err(e) => {
                let e = anyhow::Error::new(e);
                warn!("Error retrieving track {}: {:#}", track.title(), e);
                return Ok(TrackOutcome::Skipped(SkipReason::FetchFailed(format!("{:#}", e))));
            }
        };

        let path = dir.join(format_filename(track));
        tokio::fs::write(&path, &audio)
            .await
            .map_err(|source| DownloadError::Io {
                path: path.clone(),
                source,
            })?;
        debug!("Wrote {} bytes to {}", audio.len(), path.display());

        let cover = match track.art_url() {
            Some(url) => match self.fetcher.fetch_image(url).await {
                Ok(cover) => Some(cover),
                Err(e) => {
                    warn!("Failed to fetch cover art for {}: {}", track.title(), e);
                    None
                }
            },
            None => None,
        };

        let tags = TrackTags::resolve(track, &self.defaults);
        let tag_path = path.clone();
        tokio::task::spawn_blocking(move || write_tags(&tag_path, &tags, cover.as_ref()))
            .await?
            .map_err(|source| DownloadError::Tag {
                path: path.clone(),
                source,
            })?;

        Ok(TrackOutcome::Written {
            path,
            bytes: audio.len() as u64,
        })
    }
}
