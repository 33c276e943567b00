use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MarkerId;
use crate::geo::LatLng;

/// Which identity policy a deployment uses. Exactly one is active per session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPolicy {
    /// `"{lat}_{lng}"` of the initial position. Collides on identical coordinates.
    Coordinates,
    /// Random UUID v4, available immediately.
    #[default]
    Token,
    /// Key handed out by the remote store once the create call returns.
    StoreAssigned,
}

/// Result of an allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Final id, usable right away for overlay, route and remote wiring.
    Ready(MarkerId),
    /// Local placeholder; replaced once the remote store answers.
    Pending(MarkerId),
}

impl Identity {
    pub fn id(&self) -> &MarkerId {
        match self {
            Identity::Ready(id) | Identity::Pending(id) => id,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Identity::Pending(_))
    }
}

/// Assigns ids to newly created markers.
pub trait IdentityAllocator: Send + Sync {
    fn policy(&self) -> IdentityPolicy;

    /// Must not block or fail.
    fn allocate(&self, at: LatLng) -> Identity;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CoordinateAllocator;

impl IdentityAllocator for CoordinateAllocator {
    fn policy(&self) -> IdentityPolicy {
        IdentityPolicy::Coordinates
    }

    fn allocate(&self, at: LatLng) -> Identity {
        Identity::Ready(MarkerId::new(format!("{}_{}", at.lat, at.lng)))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokenAllocator;

impl IdentityAllocator for TokenAllocator {
    fn policy(&self) -> IdentityPolicy {
        IdentityPolicy::Token
    }

    fn allocate(&self, _at: LatLng) -> Identity {
        Identity::Ready(MarkerId::new(Uuid::new_v4().to_string()))
    }
}

/// Hands out `pending-{n}` placeholders; the session swaps them for the
/// store-assigned key when the remote create completes.
#[derive(Debug)]
pub struct StoreAssignedAllocator {
    seq: AtomicU64,
}

impl StoreAssignedAllocator {
    pub const PREFIX: &'static str = "pending-";

    pub fn new() -> Self {
        StoreAssignedAllocator {
            seq: AtomicU64::new(1),
        }
    }
}

impl Default for StoreAssignedAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityAllocator for StoreAssignedAllocator {
    fn policy(&self) -> IdentityPolicy {
        IdentityPolicy::StoreAssigned
    }

    fn allocate(&self, _at: LatLng) -> Identity {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        Identity::Pending(MarkerId::new(format!("{}{}", Self::PREFIX, n)))
    }
}

/// Build the allocator for a configured policy.
pub fn allocator_for(policy: IdentityPolicy) -> Box<dyn IdentityAllocator> {
    match policy {
        IdentityPolicy::Coordinates => Box::new(CoordinateAllocator),
        IdentityPolicy::Token => Box::new(TokenAllocator),
        IdentityPolicy::StoreAssigned => Box::new(StoreAssignedAllocator::new()),
    }
}
