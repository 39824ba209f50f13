//! Subsonic API response models

use serde::Deserialize;

/// Wrapper for all Subsonic API responses
#[derive(Debug, Clone, Deserialize)]
pub struct SubsonicResponse<T> {
    #[serde(rename = "subsonic-response")]
    pub subsonic_response: SubsonicResponseInner<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubsonicResponseInner<T> {
    pub status: String,
    pub version: String,
    #[serde(flatten)]
    pub data: Option<T>,
    pub error: Option<SubsonicError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubsonicError {
    pub code: i32,
    pub message: String,
}

/// Payload of responses that carry nothing but a status
#[derive(Debug, Clone, Deserialize)]
pub struct Empty {}

// search3 response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchData {
    #[serde(rename = "searchResult3")]
    pub search_result: SearchResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub song: Vec<Song>,
}

/// Song from the library
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    pub album: Option<String>,
    pub artist: Option<String>,
    /// OpenSubsonic extension
    pub display_album_artist: Option<String>,
    pub track: Option<u32>,
    pub disc_number: Option<u32>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub cover_art: Option<String>,
    pub duration: Option<u32>,
    pub suffix: Option<String>,
}

// getPodcasts response
#[derive(Debug, Clone, Deserialize)]
pub struct PodcastsData {
    pub podcasts: PodcastList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PodcastList {
    #[serde(default)]
    pub channel: Vec<PodcastChannel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastChannel {
    pub id: String,
    pub title: Option<String>,
    pub cover_art: Option<String>,
    #[serde(default)]
    pub episode: Vec<PodcastEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastEpisode {
    pub id: String,
    /// Only present once the server has downloaded the episode
    pub stream_id: Option<String>,
    pub title: Option<String>,
    pub publish_date: Option<String>,
    pub cover_art: Option<String>,
    pub status: Option<String>,
}
