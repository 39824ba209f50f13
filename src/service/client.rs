//! Subsonic API HTTP client

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::auth::generate_auth_params;
use super::models::*;
use super::AccountService;
use crate::library::{ArtRef, Timestamp, TrackRecord};

/// Default number of songs requested per search3 page
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// HTTP client for the Subsonic REST API
#[derive(Clone)]
pub struct SubsonicClient {
    base_url: String,
    username: String,
    password: String,
    page_size: u32,
    http_client: Client,
}

impl SubsonicClient {
    /// Create a new Subsonic client
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url).with_context(|| format!("Invalid server URL: {}", base_url))?;

        let http_client = Client::builder()
            .user_agent(concat!("tunedl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url,
            username: username.to_string(),
            password: password.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            http_client,
        })
    }

    /// Set the number of songs fetched per library page
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Build URL with authentication parameters
    fn build_url(&self, endpoint: &str) -> String {
        let query: String = generate_auth_params(&self.username, &self.password)
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/rest/{}?{}", self.base_url, endpoint, query)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<Option<T>> {
        let response: SubsonicResponse<T> = self
            .http_client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", what))?
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", what))?;

        check_response(&response)?;
        Ok(response.subsonic_response.data)
    }

    /// Test connection to the Subsonic server
    pub async fn ping(&self) -> Result<()> {
        let url = self.build_url("ping");
        debug!("Pinging Subsonic server at {}", self.base_url);
        self.get::<Empty>(&url, "ping").await?;
        Ok(())
    }

    /// One page of songs from an empty search3 query
    async fn search_songs(&self, offset: u32) -> Result<Vec<Song>> {
        let url = format!(
            "{}&query=&artistCount=0&albumCount=0&songCount={}&songOffset={}",
            self.build_url("search3"),
            self.page_size,
            offset
        );
        debug!("Fetching songs {}..{}", offset, offset + self.page_size);

        Ok(self
            .get::<SearchData>(&url, "songs")
            .await?
            .map(|d| d.search_result.song)
            .unwrap_or_default())
    }

    /// Cover art URL for a cover art id
    pub fn get_cover_art_url(&self, id: &str) -> String {
        format!("{}&id={}", self.build_url("getCoverArt"), urlencoding::encode(id))
    }

    fn get_stream_url(&self, id: &str) -> String {
        format!(
            "{}&id={}&format=mp3",
            self.build_url("stream"),
            urlencoding::encode(id)
        )
    }

    fn song_to_record(&self, song: Song) -> TrackRecord {
        let album_artist = song.display_album_artist.clone().or_else(|| song.artist.clone());

        TrackRecord {
            id: Some(song.id),
            title: Some(song.title),
            artist: song.artist,
            album: song.album,
            album_artist,
            genre: song.genre,
            year: song.year,
            track_number: song.track,
            disc_number: song.disc_number,
            album_art_ref: song
                .cover_art
                .map(|id| vec![ArtRef::new(self.get_cover_art_url(&id))]),
            ..Default::default()
        }
    }

    fn episode_to_record(&self, channel: &PodcastChannel, episode: PodcastEpisode) -> Option<TrackRecord> {
        let stream_id = episode.stream_id?;
        let show = channel.title.clone();

        let published = episode
            .publish_date
            .as_deref()
            .and_then(|date| DateTime::parse_from_rfc3339(date).ok())
            .map(|date| Timestamp::Text(date.timestamp_millis().to_string()));

        let cover = episode.cover_art.as_ref().or(channel.cover_art.as_ref());

        Some(TrackRecord {
            episode_id: Some(stream_id),
            title: Some(episode.title.unwrap_or_else(|| episode.id.clone())),
            artist: show.clone(),
            album: show.clone(),
            album_artist: show,
            publication_timestamp_millis: published,
            art: cover.map(|id| vec![ArtRef::new(self.get_cover_art_url(id))]),
            ..Default::default()
        })
    }
}

#[async_trait]
impl AccountService for SubsonicClient {
    async fn list_songs(&self) -> Result<Vec<TrackRecord>> {
        let mut records = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.search_songs(offset).await?;
            let short_page = (page.len() as u32) < self.page_size;
            offset += page.len() as u32;
            records.extend(page.into_iter().map(|song| self.song_to_record(song)));

            if short_page {
                break;
            }
        }

        debug!("Found {} songs", records.len());
        Ok(records)
    }

    async fn list_podcast_episodes(&self) -> Result<Vec<TrackRecord>> {
        let url = format!("{}&includeEpisodes=true", self.build_url("getPodcasts"));
        debug!("Fetching podcasts");

        let channels = self
            .get::<PodcastsData>(&url, "podcasts")
            .await?
            .map(|d| d.podcasts.channel)
            .unwrap_or_default();

        let episodes: Vec<TrackRecord> = channels
            .into_iter()
            .flat_map(|mut channel| {
                let episodes = std::mem::take(&mut channel.episode);
                episodes
                    .into_iter()
                    .filter_map(|episode| self.episode_to_record(&channel, episode))
                    .collect::<Vec<_>>()
            })
            .collect();

        debug!("Found {} downloadable episodes", episodes.len());
        Ok(episodes)
    }

    async fn stream_url(&self, id: &str) -> Result<String> {
        Ok(self.get_stream_url(id))
    }

    async fn episode_stream_url(&self, id: &str) -> Result<String> {
        Ok(self.get_stream_url(id))
    }
}

/// Check response status and return error if failed
fn check_response<T>(response: &SubsonicResponse<T>) -> Result<()> {
    if response.subsonic_response.status != "ok" {
        if let Some(error) = &response.subsonic_response.error {
            anyhow::bail!("Subsonic error {}: {}", error.code, error.message);
        }
        anyhow::bail!("Unknown Subsonic error");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SubsonicClient {
        SubsonicClient::new("http://music.local:4533/", "user", "pass").unwrap()
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(SubsonicClient::new("not a url", "u", "p").is_err());
    }

    #[test]
    fn test_stream_url_is_signed() {
        let url = client().get_stream_url("s 1");
        assert!(url.starts_with("http://music.local:4533/rest/stream?u=user&t="));
        assert!(url.contains("&c=tunedl&f=json"));
        assert!(url.ends_with("&id=s%201&format=mp3"));
    }

    #[test]
    fn test_song_to_record() {
        let client = client();
        let song = Song {
            id: "s1".to_string(),
            title: "Song".to_string(),
            album: Some("LP".to_string()),
            artist: Some("Feat. Band".to_string()),
            display_album_artist: Some("Band".to_string()),
            track: Some(3),
            disc_number: Some(2),
            year: Some(2004),
            genre: None,
            cover_art: Some("al-9".to_string()),
            duration: Some(200),
            suffix: Some("mp3".to_string()),
        };

        let record = client.song_to_record(song);
        assert_eq!(record.id.as_deref(), Some("s1"));
        assert_eq!(record.artist(), "Feat. Band");
        assert_eq!(record.album_artist(), "Band");
        assert_eq!(record.track_number, Some(3));
        assert_eq!(record.disc_number, Some(2));
        assert!(record.art_url().unwrap().contains("/rest/getCoverArt?"));
        assert!(record.art_url().unwrap().ends_with("&id=al-9"));
    }

    #[test]
    fn test_episode_to_record() {
        let client = client();
        let channel = PodcastChannel {
            id: "c1".to_string(),
            title: Some("Show".to_string()),
            cover_art: Some("pod-c1".to_string()),
            episode: vec![],
        };
        let episode = PodcastEpisode {
            id: "e1".to_string(),
            stream_id: Some("st1".to_string()),
            title: Some("Pilot".to_string()),
            publish_date: Some("2020-03-14T12:00:00Z".to_string()),
            cover_art: None,
            status: Some("completed".to_string()),
        };

        let record = client.episode_to_record(&channel, episode).unwrap();
        assert_eq!(record.episode_id.as_deref(), Some("st1"));
        assert_eq!(record.album_artist(), "Show");
        assert_eq!(record.publication_millis(), Some(1_584_187_200_000));
        assert!(record.art.as_ref().unwrap()[0].url.ends_with("&id=pod-c1"));
        assert!(record.genre.is_none());
    }

    #[test]
    fn test_episode_without_stream_is_dropped() {
        let client = client();
        let channel = PodcastChannel {
            id: "c1".to_string(),
            title: None,
            cover_art: None,
            episode: vec![],
        };
        let episode = PodcastEpisode {
            id: "e2".to_string(),
            stream_id: None,
            title: None,
            publish_date: None,
            cover_art: None,
            status: Some("skipped".to_string()),
        };
        assert!(client.episode_to_record(&channel, episode).is_none());
    }
}
