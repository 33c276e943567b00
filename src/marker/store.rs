use tracing::debug;

use super::{allocator_for, Identity, IdentityAllocator, IdentityPolicy, Marker, MarkerId};
use crate::error::SyncError;
use crate::geo::LatLng;

/// Ordered marker collection (oldest first).
///
/// Insertion order is significant: the route chain builder reads the last two
/// entries. Ids are unique at all times.
pub struct MarkerStore {
    markers: Vec<Marker>,
    allocator: Box<dyn IdentityAllocator>,
}

impl MarkerStore {
    pub fn new(allocator: Box<dyn IdentityAllocator>) -> Self {
        MarkerStore {
            markers: Vec::new(),
            allocator,
        }
    }

    pub fn with_policy(policy: IdentityPolicy) -> Self {
        Self::new(allocator_for(policy))
    }

    pub fn policy(&self) -> IdentityPolicy {
        self.allocator.policy()
    }

    /// Allocate an id and append a new marker at `at`.
    pub fn create(&mut self, at: LatLng) -> Result<Marker, SyncError> {
        let mut identity = self.allocator.allocate(at);
        // A loaded record may already use a placeholder key; skip past it.
        while identity.is_pending() && self.contains(identity.id()) {
            identity = self.allocator.allocate(at);
        }
        let pending = identity.is_pending();
        let id = match identity {
            Identity::Ready(id) | Identity::Pending(id) => id,
        };

        let mut marker = Marker::new(id, at);
        marker.pending = pending;
        self.insert(marker)
    }

    /// Append a record whose id is already known (e.g. loaded from the remote store).
    pub fn insert(&mut self, marker: Marker) -> Result<Marker, SyncError> {
        if self.contains(&marker.id) {
            return Err(SyncError::DuplicateId(marker.id));
        }
        debug!(id = %marker.id, lat = marker.lat, lng = marker.lng, "marker added");
        self.markers.push(marker.clone());
        Ok(marker)
    }

    pub fn update_position(&mut self, id: &MarkerId, at: LatLng) -> Result<Marker, SyncError> {
        let marker = self
            .markers
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| SyncError::NotFound(id.clone()))?;
        marker.lat = at.lat;
        marker.lng = at.lng;
        debug!(id = %id, lat = at.lat, lng = at.lng, "marker moved");
        Ok(marker.clone())
    }

    pub fn delete(&mut self, id: &MarkerId) -> Result<Marker, SyncError> {
        let index = self
            .position_of(id)
            .ok_or_else(|| SyncError::NotFound(id.clone()))?;
        debug!(id = %id, "marker deleted");
        Ok(self.markers.remove(index))
    }

    pub fn delete_all(&mut self) -> Vec<Marker> {
        debug!(count = self.markers.len(), "all markers deleted");
        std::mem::take(&mut self.markers)
    }

    /// Swap a placeholder id for the store-assigned one. Position in the
    /// ordering is preserved.
    pub fn rename(&mut self, from: &MarkerId, to: MarkerId) -> Result<Marker, SyncError> {
        if self.contains(&to) {
            return Err(SyncError::DuplicateId(to));
        }
        let marker = self
            .markers
            .iter_mut()
            .find(|m| &m.id == from)
            .ok_or_else(|| SyncError::NotFound(from.clone()))?;
        marker.id = to;
        marker.pending = false;
        Ok(marker.clone())
    }

    pub fn get(&self, id: &MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &MarkerId) -> bool {
        self.position_of(id).is_some()
    }

    pub fn snapshot(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    fn position_of(&self, id: &MarkerId) -> Option<usize> {
        self.markers.iter().position(|m| &m.id == id)
    }
}

impl Default for MarkerStore {
    fn default() -> Self {
        Self::with_policy(IdentityPolicy::default())
    }
}
