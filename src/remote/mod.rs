//! Remote - the persistent key-value mirror of the marker set.
//!
//! The remote store is never authoritative during a session: it is loaded
//! once at startup and then mirrors local mutations on a best-effort basis.
//!
//! - `MarkerRepository` - store port
//! - `InMemoryMarkerRepository` - clone-friendly store with scripted failures
//! - `HttpMarkerRepository` - REST client (requires the `http` feature)

mod error;
#[cfg(feature = "http")]
mod http;
mod in_memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geo::LatLng;
use crate::marker::{Marker, MarkerId};

pub use error::RemoteError;
#[cfg(feature = "http")]
pub use http::HttpMarkerRepository;
pub use in_memory::{InMemoryMarkerRepository, RemoteCall};

/// A marker as persisted remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    pub id: MarkerId,
    pub lat: f64,
    pub lng: f64,
}

impl MarkerRecord {
    pub fn new(id: impl Into<MarkerId>, at: LatLng) -> Self {
        MarkerRecord {
            id: id.into(),
            lat: at.lat,
            lng: at.lng,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

impl From<MarkerRecord> for Marker {
    fn from(record: MarkerRecord) -> Self {
        Marker::new(record.id, LatLng::new(record.lat, record.lng))
    }
}

/// Port to the remote marker store.
#[async_trait]
pub trait MarkerRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<MarkerRecord>, RemoteError>;

    /// Persist a new marker. With `Some(id)` the record is stored under that
    /// key; with `None` the store assigns one. Returns the effective key.
    async fn create(&self, id: Option<&MarkerId>, at: LatLng) -> Result<MarkerId, RemoteError>;

    async fn update(&self, id: &MarkerId, at: LatLng) -> Result<(), RemoteError>;

    async fn delete(&self, id: &MarkerId) -> Result<(), RemoteError>;

    /// Delete every stored marker: list, then delete each listed id.
    /// Ids that vanished in between are not an error. Returns the number
    /// of records deleted.
    async fn delete_all(&self) -> Result<usize, RemoteError> {
        let records = self.list().await?;
        let mut deleted = 0;
        for record in &records {
            match self.delete(&record.id).await {
                Ok(()) => deleted += 1,
                Err(RemoteError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(deleted)
    }
}
