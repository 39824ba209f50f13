//! Track records as delivered by the account service

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata describing one downloadable audio item (song or podcast episode)
///
/// Field names follow the service's camelCase keys. Keys this struct does
/// not know about are kept in `extra`, and known keys given as `null` are
/// remembered in `null_keys`, so a record survives a trip through its JSON
/// payload unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_timestamp_millis: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art_ref: Option<Vec<ArtRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_art_ref: Option<Vec<ArtRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art: Option<Vec<ArtRef>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Known keys that were present in the payload with a `null` value
    #[serde(skip)]
    pub null_keys: Vec<String>,
}

/// Millisecond timestamp, kept in whichever JSON form the service used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Number(i64),
    Text(String),
}

impl Timestamp {
    pub fn millis(&self) -> Option<i64> {
        match self {
            Timestamp::Number(n) => Some(*n),
            Timestamp::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Reference to an album, artist or episode image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtRef {
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArtRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extra: Map::new(),
        }
    }
}

/// Which stream call an identifier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Song,
    Episode,
}

/// Identifier used to request a stream URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub value: String,
    pub kind: IdentifierKind,
}

impl TrackRecord {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn artist(&self) -> &str {
        self.artist.as_deref().unwrap_or_default()
    }

    pub fn album(&self) -> &str {
        self.album.as_deref().unwrap_or_default()
    }

    pub fn album_artist(&self) -> &str {
        self.album_artist.as_deref().unwrap_or_default()
    }

    /// Resolve the stream identifier
    ///
    /// The value is taken from `id`, then `storeId`, then `episodeId`. Any
    /// record carrying an `episodeId` is streamed through the episode call.
    pub fn identifier(&self) -> Option<Identifier> {
        let value = self
            .id
            .as_ref()
            .or(self.store_id.as_ref())
            .or(self.episode_id.as_ref())?
            .clone();

        let kind = if self.episode_id.is_some() {
            IdentifierKind::Episode
        } else {
            IdentifierKind::Song
        };

        Some(Identifier { value, kind })
    }

    /// Any identifier, for labelling and lookups
    pub fn any_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .or(self.store_id.as_deref())
            .or(self.episode_id.as_deref())
    }

    pub fn publication_millis(&self) -> Option<i64> {
        self.publication_timestamp_millis.as_ref()?.millis()
    }

    /// URL of the cover image: album art, then artist art, then generic art
    pub fn art_url(&self) -> Option<&str> {
        [&self.album_art_ref, &self.artist_art_ref, &self.art]
            .into_iter()
            .filter_map(|refs| refs.as_ref()?.first())
            .map(|art| art.url.as_str())
            .next()
    }

    /// Serialize to the JSON text form used for exports
    pub fn to_payload(&self) -> serde_json::Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            for key in &self.null_keys {
                map.entry(key.clone()).or_insert(Value::Null);
            }
        }
        serde_json::to_string(&value)
    }

    /// Parse a record from its JSON text form
    pub fn from_payload(payload: &str) -> serde_json::Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(payload)?;
        let nulls: Vec<String> = map
            .iter()
            .filter(|(_, value)| value.is_null())
            .map(|(key, _)| key.clone())
            .collect();

        let mut record: Self = serde_json::from_value(Value::Object(map))?;
        // Unknown keys already keep their nulls in `extra`
        record.null_keys = nulls
            .into_iter()
            .filter(|key| !record.extra.contains_key(key))
            .collect();
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_priority() {
        let mut track = TrackRecord {
            store_id: Some("store".to_string()),
            episode_id: Some("episode".to_string()),
            ..Default::default()
        };
        let ident = track.identifier().unwrap();
        assert_eq!(ident.value, "store");
        assert_eq!(ident.kind, IdentifierKind::Episode);

        track.id = Some("primary".to_string());
        assert_eq!(track.identifier().unwrap().value, "primary");

        track.episode_id = None;
        assert_eq!(track.identifier().unwrap().kind, IdentifierKind::Song);
    }

    #[test]
    fn test_missing_identifier() {
        let track = TrackRecord {
            title: Some("Orphan".to_string()),
            ..Default::default()
        };
        assert!(track.identifier().is_none());
        assert!(track.any_id().is_none());
    }

    #[test]
    fn test_art_url_priority() {
        let mut track = TrackRecord {
            art: Some(vec![ArtRef::new("http://art")]),
            ..Default::default()
        };
        assert_eq!(track.art_url(), Some("http://art"));

        track.artist_art_ref = Some(vec![ArtRef::new("http://artist")]);
        assert_eq!(track.art_url(), Some("http://artist"));

        track.album_art_ref = Some(vec![]);
        assert_eq!(track.art_url(), Some("http://artist"));

        track.album_art_ref = Some(vec![ArtRef::new("http://album")]);
        assert_eq!(track.art_url(), Some("http://album"));
    }

    #[test]
    fn test_payload_round_trip() {
        let original = json!({
            "id": "3b6c5a2e",
            "title": "Hey/Now",
            "artist": "Someone",
            "album": "Record",
            "albumArtist": "Someone",
            "genre": "Rock",
            "year": 1999,
            "trackNumber": 4,
            "discNumber": 1,
            "durationMillis": "215000",
            "albumArtRef": [{ "url": "http://img/1", "kind": "sj#imageRef" }],
            "rating": 5
        });

        let track: TrackRecord = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(track.title(), "Hey/Now");
        assert_eq!(track.track_number, Some(4));
        assert_eq!(track.extra.get("rating"), Some(&json!(5)));

        let payload = track.to_payload().unwrap();
        let back: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(back, original);
        assert_eq!(TrackRecord::from_payload(&payload).unwrap(), track);
    }

    #[test]
    fn test_sparse_payload_round_trip() {
        let original = json!({
            "id": "a",
            "title": "T",
            "genre": null,
            "year": null,
            "custom": null
        });

        let track = TrackRecord::from_payload(&original.to_string()).unwrap();
        assert_eq!(track.title(), "T");
        assert_eq!(track.artist(), "");
        assert!(track.album.is_none());
        assert!(track.genre.is_none());
        assert_eq!(track.null_keys, ["genre", "year"]);

        let back: Value = serde_json::from_str(&track.to_payload().unwrap()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_null_title_is_accepted() {
        let track = TrackRecord::from_payload(r#"{"id":"a","title":null}"#).unwrap();
        assert!(track.title.is_none());
        assert_eq!(track.title(), "");

        let back: Value = serde_json::from_str(&track.to_payload().unwrap()).unwrap();
        assert_eq!(back, json!({"id": "a", "title": null}));
    }

    #[test]
    fn test_episode_timestamp_kept_as_text() {
        let original = json!({
            "episodeId": "ep1",
            "title": "Episode 1",
            "artist": "Show",
            "album": "Show",
            "albumArtist": "Show",
            "publicationTimestampMillis": "1584187200000",
            "art": [{ "url": "http://img/ep" }]
        });

        let track: TrackRecord = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(track.publication_millis(), Some(1_584_187_200_000));
        assert_eq!(serde_json::to_value(&track).unwrap(), original);
    }
}
