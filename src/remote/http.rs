//! REST client for a document-style marker collection.
//!
//! ## Routes
//!
//! - `GET {base}` - list, body `[{ "id", "lat", "lng" }, ...]`
//! - `POST {base}` - create with a store-assigned key, answers `{ "id": ... }`
//! - `PUT {base}/{id}` - create under a client-chosen key
//! - `PATCH {base}/{id}` - move, `404` when the id is unknown
//! - `DELETE {base}/{id}` - delete, `404` when the id is unknown

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{MarkerRecord, MarkerRepository, RemoteError};
use crate::geo::LatLng;
use crate::marker::MarkerId;

#[derive(Deserialize)]
struct Created {
    id: MarkerId,
}

#[derive(Debug, Clone)]
pub struct HttpMarkerRepository {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMarkerRepository {
    /// `base_url` is the collection URL, e.g. `https://host/api/markers`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        HttpMarkerRepository {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn record_url(&self, id: &MarkerId) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

fn check(response: reqwest::Response, id: Option<&MarkerId>) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => Err(RemoteError::NotFound(id.clone())),
        _ if status.is_success() => Ok(response),
        _ => Err(RemoteError::Status(status.as_u16())),
    }
}

#[async_trait]
impl MarkerRepository for HttpMarkerRepository {
    async fn list(&self) -> Result<Vec<MarkerRecord>, RemoteError> {
        let response = self.client.get(&self.base_url).send().await.map_err(transport)?;
        check(response, None)?
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn create(&self, id: Option<&MarkerId>, at: LatLng) -> Result<MarkerId, RemoteError> {
        match id {
            Some(id) => {
                let response = self
                    .client
                    .put(self.record_url(id))
                    .json(&at)
                    .send()
                    .await
                    .map_err(transport)?;
                check(response, None)?;
                Ok(id.clone())
            }
            None => {
                let response = self
                    .client
                    .post(&self.base_url)
                    .json(&at)
                    .send()
                    .await
                    .map_err(transport)?;
                let created: Created = check(response, None)?
                    .json()
                    .await
                    .map_err(|e| RemoteError::Decode(e.to_string()))?;
                Ok(created.id)
            }
        }
    }

    async fn update(&self, id: &MarkerId, at: LatLng) -> Result<(), RemoteError> {
        let response = self
            .client
            .patch(self.record_url(id))
            .json(&at)
            .send()
            .await
            .map_err(transport)?;
        check(response, Some(id))?;
        Ok(())
    }

    async fn delete(&self, id: &MarkerId) -> Result<(), RemoteError> {
        let response = self
            .client
            .delete(self.record_url(id))
            .send()
            .await
            .map_err(transport)?;
        check(response, Some(id))?;
        Ok(())
    }
}
