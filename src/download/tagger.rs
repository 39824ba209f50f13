//! ID3 tagging of downloaded tracks

use std::path::Path;

use id3::frame::{Picture, PictureType};
use id3::{Tag, TagLike, Timestamp, Version};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fetch::CoverArt;
use crate::library::TrackRecord;

/// Values written when a track record does not provide them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagDefaults {
    pub genre: String,
    pub track_number: u32,
    pub disc_number: u32,
}

impl Default for TagDefaults {
    fn default() -> Self {
        Self {
            genre: "Podcast".to_string(),
            track_number: 0,
            disc_number: 1,
        }
    }
}

/// Tag values for one file, after defaults are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
    pub genre: String,
    /// Only set for a known, non-zero year
    pub year: Option<i32>,
    pub track_number: u32,
    pub disc_number: u32,
}

impl TrackTags {
    pub fn resolve(track: &TrackRecord, defaults: &TagDefaults) -> Self {
        Self {
            title: track.title().to_string(),
            artist: track.artist().to_string(),
            album: track.album().to_string(),
            album_artist: track.album_artist().to_string(),
            genre: track.genre.clone().unwrap_or_else(|| defaults.genre.clone()),
            year: track.year.filter(|&year| year != 0),
            track_number: track.track_number.unwrap_or(defaults.track_number),
            disc_number: track.disc_number.unwrap_or(defaults.disc_number),
        }
    }
}

fn year_only(year: i32) -> Timestamp {
    Timestamp {
        year,
        month: None,
        day: None,
        hour: None,
        minute: None,
        second: None,
    }
}

/// Replace the file's ID3 tag with `tags` (and the cover, if any)
pub fn write_tags(path: &Path, tags: &TrackTags, cover: Option<&CoverArt>) -> id3::Result<()> {
    let mut tag = Tag::new();

    tag.set_title(tags.title.as_str());
    tag.set_artist(tags.artist.as_str());
    tag.set_album(tags.album.as_str());
    tag.set_album_artist(tags.album_artist.as_str());
    tag.set_genre(tags.genre.as_str());

    if let Some(year) = tags.year {
        tag.set_date_released(year_only(year));
        tag.set_original_date_released(year_only(year));
        tag.set_date_recorded(year_only(year));
    }

    tag.set_track(tags.track_number);
    tag.set_disc(tags.disc_number);

    if let Some(cover) = cover {
        tag.add_frame(Picture {
            mime_type: cover.mime_type.clone(),
            picture_type: PictureType::CoverFront,
            description: String::new(),
            data: cover.data.clone(),
        });
    }

    tag.write_to_path(path, Version::Id3v24)?;
    debug!("Tagged {}", path.display());
    Ok(())
}
