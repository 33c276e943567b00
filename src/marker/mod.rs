//! Markers - the authoritative in-memory point collection.
//!
//! - `Marker` / `MarkerId` - the record and its identity
//! - `IdentityAllocator` - pluggable id policy (coordinates, token, store-assigned)
//! - `MarkerStore` - ordered collection, the single source of truth for a session

mod identity;
mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

pub use identity::{
    allocator_for, CoordinateAllocator, Identity, IdentityAllocator, IdentityPolicy,
    StoreAssignedAllocator, TokenAllocator,
};
pub use store::MarkerStore;

/// Stable marker identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(id: impl Into<String>) -> Self {
        MarkerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(id: &str) -> Self {
        MarkerId(id.to_string())
    }
}

impl From<String> for MarkerId {
    fn from(id: String) -> Self {
        MarkerId(id)
    }
}

/// A user-placed point with stable identity and mutable coordinates.
///
/// `pending` is set while `id` is a local placeholder waiting for the remote
/// store to assign the real key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
}

impl Marker {
    pub fn new(id: impl Into<MarkerId>, at: LatLng) -> Self {
        Marker {
            id: id.into(),
            lat: at.lat,
            lng: at.lng,
            pending: false,
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}
