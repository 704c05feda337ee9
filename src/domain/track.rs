use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// Primary key of a track, assigned by the database on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub i64);

impl FromStr for TrackId {
    type Err = std::num::ParseIntError;

    /// Only a complete base-10 integer is accepted: "1.5x" is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(TrackId)
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represent a music track as stored and as served over HTTP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub track_id: TrackId,
    pub song_title: String,
    pub artist_name: String,
    pub album_name: String,
    pub genre: String,
    /// in seconds
    pub duration: Option<i64>,
    pub release_year: Option<i64>,
}

/// A validated track that has no id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
    pub song_title: String,
    pub artist_name: String,
    pub album_name: String,
    pub genre: String,
    pub duration: Option<i64>,
    pub release_year: Option<i64>,
}

impl NewTrack {
    pub fn with_id(self, track_id: TrackId) -> Track {
        Track {
            track_id,
            song_title: self.song_title,
            artist_name: self.artist_name,
            album_name: self.album_name,
            genre: self.genre,
            duration: self.duration,
            release_year: self.release_year,
        }
    }
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackChanges {
    pub song_title: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<i64>,
    pub release_year: Option<i64>,
}

impl TrackChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// applies the changes on top of an existing track
    pub fn merge_into(self, track: Track) -> Track {
        Track {
            track_id: track.track_id,
            song_title: self.song_title.unwrap_or(track.song_title),
            artist_name: self.artist_name.unwrap_or(track.artist_name),
            album_name: self.album_name.unwrap_or(track.album_name),
            genre: self.genre.unwrap_or(track.genre),
            duration: self.duration.or(track.duration),
            release_year: self.release_year.or(track.release_year),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track {
            track_id: TrackId(7),
            song_title: "Song".into(),
            artist_name: "Artist".into(),
            album_name: "Album".into(),
            genre: "Rock".into(),
            duration: Some(180),
            release_year: None,
        }
    }

    #[test]
    fn test_track_id_parsing() {
        assert_eq!("42".parse::<TrackId>(), Ok(TrackId(42)));
        assert_eq!("-3".parse::<TrackId>(), Ok(TrackId(-3)));
        assert!("abc".parse::<TrackId>().is_err());
        assert!("1.5x".parse::<TrackId>().is_err());
        assert!("1.5".parse::<TrackId>().is_err());
        assert!("".parse::<TrackId>().is_err());
    }

    #[test]
    fn test_track_serializes_with_api_field_names() -> anyhow::Result<()> {
        let json = serde_json::to_value(track())?;

        assert_eq!(
            json,
            serde_json::json!({
                "trackId": 7,
                "songTitle": "Song",
                "artistName": "Artist",
                "albumName": "Album",
                "genre": "Rock",
                "duration": 180,
                "releaseYear": null,
            })
        );

        Ok(())
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let changes = TrackChanges {
            genre: Some("Jazz".into()),
            duration: Some(0),
            ..Default::default()
        };

        let merged = changes.merge_into(track());

        assert_eq!(merged.genre, "Jazz");
        assert_eq!(merged.duration, Some(0));
        assert_eq!(merged.song_title, "Song");
        assert_eq!(merged.release_year, None);
        assert_eq!(merged.track_id, TrackId(7));
    }

    #[test]
    fn test_empty_changes_leave_track_untouched() {
        let changes = TrackChanges::default();
        assert!(changes.is_empty());
        assert_eq!(changes.merge_into(track()), track());
    }
}
