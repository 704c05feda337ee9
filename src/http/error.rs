use rouille::Response;
use serde_json::json;

use crate::{http::payload::ValidationError, storage::error::StorageError};

pub const TRACK_NOT_FOUND: &str = "Track not found";
pub const INVALID_ID: &str = "Invalid id parameter";

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.0)
    }
}

impl ApiError {
    /// Maps a storage failure for a client.
    ///
    /// Anything but a missing track is logged and answered with `context` only.
    pub fn from_storage(err: StorageError, context: &str) -> Self {
        match err {
            StorageError::TrackNotFound(_) => ApiError::NotFound(TRACK_NOT_FOUND.into()),

            StorageError::Database(_) | StorageError::Fs(_) | StorageError::Internal(_) => {
                log::error!("{context}: {err}");
                ApiError::Internal(context.into())
            }
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg,
        }
    }

    pub fn into_response(self) -> Response {
        Response::json(&json!({ "error": self.message() })).with_status_code(self.status_code())
    }
}
