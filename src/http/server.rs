use anyhow::anyhow;
use log::info;
use rouille::{Request, Response};
use serde_json::json;
use std::{
    io::Read,
    sync::{Arc, Mutex},
};

use crate::{
    config::HttpConfig,
    domain::track::TrackId,
    http::{
        error::{ApiError, INVALID_ID},
        payload::{self, TrackPayload},
    },
    storage::{error::StorageError, operations::Storage},
};

const ALLOWED_METHODS: &str = "GET, HEAD, PUT, PATCH, POST, DELETE";

pub struct HttpServer {
    storage: Arc<Mutex<Storage>>,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(storage: Storage, config: HttpConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            config,
        }
    }

    /// Binds the configured address and serves requests until the process ends
    pub fn run(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        let server = rouille::Server::new(&addr, move |request| self.handle_request(request))
            .map_err(|e| anyhow!("Failed to listen on {addr}: {e}"))?;

        info!("Server listening on port {}", server.server_addr().port());
        server.run();
        Ok(())
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = if request.method() == "OPTIONS" {
            Self::handle_preflight(request)
        } else if request.method() == "GET" && request.url() == "/api/tracks/" {
            Self::respond(self.list_tracks())
        } else {
            rouille::router!(request,
                (GET) (/api/tracks) => {
                    Self::respond(self.list_tracks())
                },
                (POST) (/api/tracks) => {
                    Self::respond(self.create_track(request))
                },
                (GET) (/api/tracks/{id: String}) => {
                    Self::respond(self.get_track(&id))
                },
                (PUT) (/api/tracks/{id: String}) => {
                    Self::respond(self.update_track(&id, request))
                },
                (DELETE) (/api/tracks/{id: String}) => {
                    Self::respond(self.delete_track(&id))
                },
                _ => ApiError::NotFound("Not found".into()).into_response()
            )
        };

        let response = response.with_additional_header("Access-Control-Allow-Origin", "*");

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn respond(result: Result<Response, ApiError>) -> Response {
        result.unwrap_or_else(ApiError::into_response)
    }

    /// answers CORS preflight for any path, echoing the requested headers
    fn handle_preflight(request: &Request) -> Response {
        let response = Response::empty_204()
            .with_additional_header("Access-Control-Allow-Methods", ALLOWED_METHODS);

        match request.header("Access-Control-Request-Headers") {
            Some(headers) => {
                response.with_additional_header("Access-Control-Allow-Headers", headers.to_owned())
            }
            None => response,
        }
    }

    /// Runs `f` with exclusive access to the storage handle
    fn with_storage<T>(
        &self,
        f: impl FnOnce(&mut Storage) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut storage = self.storage.lock().map_err(|e| {
            StorageError::Internal(anyhow!("Could not access storage under lock: {e}"))
        })?;
        f(&mut storage)
    }

    fn parse_id(id: &str) -> Result<TrackId, ApiError> {
        id.parse::<TrackId>()
            .map_err(|_| ApiError::BadRequest(INVALID_ID.into()))
    }

    fn read_payload(request: &Request) -> Result<TrackPayload, ApiError> {
        let mut body = String::new();
        if let Some(mut data) = request.data() {
            data.read_to_string(&mut body)
                .map_err(|_| ApiError::BadRequest("Request body must be UTF-8 text".into()))?;
        }
        Ok(payload::parse(&body)?)
    }

    fn list_tracks(&self) -> Result<Response, ApiError> {
        let tracks = self
            .with_storage(|storage| storage.list_tracks())
            .map_err(|e| ApiError::from_storage(e, "Failed to fetch tracks"))?;

        Ok(Response::json(&tracks))
    }

    fn get_track(&self, id: &str) -> Result<Response, ApiError> {
        let track_id = Self::parse_id(id)?;

        let track = self
            .with_storage(|storage| storage.get_track(track_id))
            .map_err(|e| ApiError::from_storage(e, "Failed to fetch track"))?;

        Ok(Response::json(&track))
    }

    fn create_track(&self, request: &Request) -> Result<Response, ApiError> {
        let new_track = Self::read_payload(request)?.into_new_track()?;

        let track = self
            .with_storage(|storage| storage.create_track(new_track))
            .map_err(|e| ApiError::from_storage(e, "Failed to create track"))?;

        Ok(Response::json(&track).with_status_code(201))
    }

    fn update_track(&self, id: &str, request: &Request) -> Result<Response, ApiError> {
        let track_id = Self::parse_id(id)?;
        let changes = Self::read_payload(request)?.into_changes()?;

        let track = self
            .with_storage(|storage| storage.update_track(track_id, changes))
            .map_err(|e| ApiError::from_storage(e, "Failed to update track"))?;

        Ok(Response::json(&track))
    }

    fn delete_track(&self, id: &str) -> Result<Response, ApiError> {
        let track_id = Self::parse_id(id)?;

        self.with_storage(|storage| storage.delete_track(track_id))
            .map_err(|e| ApiError::from_storage(e, "Failed to delete track"))?;

        Ok(Response::json(
            &json!({ "message": format!("Track {track_id} deleted") }),
        ))
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
