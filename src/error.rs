use std::fmt;

use crate::marker::MarkerId;
use crate::overlay::OverlayHandle;

/// Errors surfaced by [`MapSession`](crate::MapSession) operations.
///
/// None of these are fatal. Local state is never left half-mutated: an
/// operation that returns an error has either not touched the marker store
/// or has already committed locally and only lost its remote mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The referenced marker is not (or no longer) in the store.
    NotFound(MarkerId),
    /// Another live marker already uses this id.
    DuplicateId(MarkerId),
    /// A canvas callback referenced an overlay the reconciler does not own.
    UnknownOverlay(OverlayHandle),
    /// A route was requested with fewer than two markers placed.
    InsufficientMarkers { count: usize },
    /// The route chain already ends at the last marker.
    ChainUpToDate(MarkerId),
    /// The routing service returned an error or no route.
    RoutingFailed(String),
    /// A remote store write or notification did not go through.
    RemoteWriteFailed {
        operation: &'static str,
        reason: String,
    },
    /// The remote store could not be listed.
    RemoteReadFailed(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::NotFound(id) => write!(f, "marker not found: {}", id),
            SyncError::DuplicateId(id) => write!(f, "duplicate marker id: {}", id),
            SyncError::UnknownOverlay(handle) => write!(f, "unknown overlay: {}", handle),
            SyncError::InsufficientMarkers { count } => write!(
                f,
                "you need at least two markers to calculate a route (have {})",
                count
            ),
            SyncError::ChainUpToDate(id) => {
                write!(f, "route chain already ends at marker {}", id)
            }
            SyncError::RoutingFailed(reason) => write!(f, "routing failed: {}", reason),
            SyncError::RemoteWriteFailed { operation, reason } => {
                write!(f, "remote {} failed: {}", operation, reason)
            }
            SyncError::RemoteReadFailed(reason) => write!(f, "remote load failed: {}", reason),
        }
    }
}

impl std::error::Error for SyncError {}

impl SyncError {
    /// Whether the error only concerns the remote mirror; local state is intact
    /// and already reflects the user's intent.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteWriteFailed { .. } | SyncError::RemoteReadFailed(_)
        )
    }
}
