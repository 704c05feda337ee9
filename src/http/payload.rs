//! JSON request bodies for create and update.
//!
//! Create treats a required field as missing when it is falsy (absent, `null`, `""`, `0`, `false`).
//! Update only skips fields that are absent or `null`, so `0` and `""` are real values there.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::track::{NewTrack, TrackChanges};

pub const REQUIRED_FIELDS_MESSAGE: &str =
    "songTitle, artistName, albumName, and genre are required fields";

#[derive(Debug, PartialEq, Eq)]
pub struct ValidationError(pub String);

/// Raw body, every field still untyped. `null` and a missing key both land as `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPayload {
    #[serde(default)]
    pub song_title: Option<Value>,
    #[serde(default)]
    pub artist_name: Option<Value>,
    #[serde(default)]
    pub album_name: Option<Value>,
    #[serde(default)]
    pub genre: Option<Value>,
    #[serde(default)]
    pub duration: Option<Value>,
    #[serde(default)]
    pub release_year: Option<Value>,
}

fn is_falsy(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

fn string_field(name: &str, value: Option<Value>) -> Result<Option<String>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ValidationError(format!("{name} must be a string"))),
    }
}

fn integer_field(name: &str, value: Option<Value>) -> Result<Option<i64>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ValidationError(format!("{name} must be an integer"))),
        Some(_) => Err(ValidationError(format!("{name} must be an integer"))),
    }
}

fn required_string(name: &str, value: Option<Value>) -> Result<String, ValidationError> {
    string_field(name, value)?.ok_or_else(|| ValidationError(REQUIRED_FIELDS_MESSAGE.into()))
}

impl TrackPayload {
    pub fn into_new_track(self) -> Result<NewTrack, ValidationError> {
        let required = [
            &self.song_title,
            &self.artist_name,
            &self.album_name,
            &self.genre,
        ];
        if required.into_iter().any(is_falsy) {
            return Err(ValidationError(REQUIRED_FIELDS_MESSAGE.into()));
        }

        Ok(NewTrack {
            song_title: required_string("songTitle", self.song_title)?,
            artist_name: required_string("artistName", self.artist_name)?,
            album_name: required_string("albumName", self.album_name)?,
            genre: required_string("genre", self.genre)?,
            duration: integer_field("duration", self.duration)?,
            release_year: integer_field("releaseYear", self.release_year)?,
        })
    }

    pub fn into_changes(self) -> Result<TrackChanges, ValidationError> {
        Ok(TrackChanges {
            song_title: string_field("songTitle", self.song_title)?,
            artist_name: string_field("artistName", self.artist_name)?,
            album_name: string_field("albumName", self.album_name)?,
            genre: string_field("genre", self.genre)?,
            duration: integer_field("duration", self.duration)?,
            release_year: integer_field("releaseYear", self.release_year)?,
        })
    }
}

pub const NOT_AN_OBJECT_MESSAGE: &str = "Request body must be a JSON object";

/// Parses a request body. An empty body counts as `{}`.
///
/// Only a JSON object is accepted: a derived struct would also take an array by position.
pub fn parse(body: &str) -> Result<TrackPayload, ValidationError> {
    if body.trim().is_empty() {
        return Ok(TrackPayload::default());
    }
    let not_an_object = || ValidationError(NOT_AN_OBJECT_MESSAGE.into());

    match serde_json::from_str::<Value>(body).map_err(|_| not_an_object())? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(|_| not_an_object()),
        _ => Err(not_an_object()),
    }
}
