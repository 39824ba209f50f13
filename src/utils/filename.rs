//! Deterministic file names for downloaded tracks

use chrono::DateTime;

use super::sanitize_component;
use crate::library::TrackRecord;

/// Ordinal used when a track has neither a track number nor a usable
/// publication timestamp
const FALLBACK_ORDINAL: &str = "0";

/// Format the file name for a track: `<ordinal>-<title>-<album>-<artist>.mp3`
///
/// The ordinal is the track number when present, otherwise the publication
/// date (UTC) as `YYYY_MM_DD`.
pub fn format_filename(track: &TrackRecord) -> String {
    format!(
        "{}-{}-{}-{}.mp3",
        ordinal(track),
        sanitize_component(track.title()),
        sanitize_component(track.album()),
        sanitize_component(track.artist())
    )
}

fn ordinal(track: &TrackRecord) -> String {
    if let Some(number) = track.track_number {
        return number.to_string();
    }

    track
        .publication_millis()
        .and_then(DateTime::from_timestamp_millis)
        .map(|date| date.format("%Y_%m_%d").to_string())
        .unwrap_or_else(|| FALLBACK_ORDINAL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Timestamp;

    fn song(track_number: Option<u32>) -> TrackRecord {
        TrackRecord {
            id: Some("abc".to_string()),
            title: Some("Song".to_string()),
            artist: Some("Artist".to_string()),
            album: Some("Album".to_string()),
            album_artist: Some("Artist".to_string()),
            track_number,
            ..Default::default()
        }
    }

    #[test]
    fn test_ordinal_is_track_number() {
        for n in [0, 1, 7, 12, 250] {
            let name = format_filename(&song(Some(n)));
            assert_eq!(name.split('-').next(), Some(n.to_string().as_str()));
        }
        assert_eq!(format_filename(&song(Some(3))), "3-Song-Album-Artist.mp3");
    }

    #[test]
    fn test_ordinal_is_publication_date() {
        let mut episode = song(None);
        // 2020-03-14T12:00:00Z
        episode.publication_timestamp_millis = Some(Timestamp::Text("1584187200000".to_string()));
        assert_eq!(format_filename(&episode), "2020_03_14-Song-Album-Artist.mp3");

        episode.publication_timestamp_millis = Some(Timestamp::Number(0));
        assert_eq!(format_filename(&episode), "1970_01_01-Song-Album-Artist.mp3");
    }

    #[test]
    fn test_track_number_wins_over_date() {
        let mut track = song(Some(9));
        track.publication_timestamp_millis = Some(Timestamp::Number(1_584_187_200_000));
        assert!(format_filename(&track).starts_with("9-"));
    }

    #[test]
    fn test_fallback_ordinal() {
        assert_eq!(format_filename(&song(None)), "0-Song-Album-Artist.mp3");

        let mut track = song(None);
        track.publication_timestamp_millis = Some(Timestamp::Text("soon".to_string()));
        assert_eq!(format_filename(&track), "0-Song-Album-Artist.mp3");
    }

    #[test]
    fn test_components_are_sanitized() {
        let mut track = song(Some(1));
        track.title = Some("Either/Or".to_string());
        track.album = Some("x=y".to_string());
        track.artist = Some("AC/DC".to_string());
        assert_eq!(format_filename(&track), "1-Either_Or-x_y-AC_DC.mp3");
    }
}
