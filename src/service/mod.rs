//! Account service: library listing and stream URL resolution

use anyhow::Result;
use async_trait::async_trait;

use crate::library::TrackRecord;

pub mod auth;
pub mod client;
pub mod models;

pub use client::SubsonicClient;

/// The streaming account a library is downloaded from
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Every song in the account's library
    async fn list_songs(&self) -> Result<Vec<TrackRecord>>;

    /// Podcast episodes that can currently be streamed
    async fn list_podcast_episodes(&self) -> Result<Vec<TrackRecord>>;

    /// Stream URL for a song identifier
    async fn stream_url(&self, id: &str) -> Result<String>;

    /// Stream URL for a podcast episode identifier
    async fn episode_stream_url(&self, id: &str) -> Result<String>;
}
