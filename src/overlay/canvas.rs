use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// Opaque reference to an overlay object living on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverlayHandle(pub u64);

impl fmt::Display for OverlayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay#{}", self.0)
    }
}

/// The map widget's overlay layer.
///
/// Only the [`OverlayReconciler`](super::OverlayReconciler) calls into it.
pub trait Canvas {
    /// Attach a new overlay at `at` and return its handle.
    fn create_overlay(&mut self, at: LatLng, draggable: bool) -> OverlayHandle;

    /// Move an existing overlay in place.
    fn set_overlay_position(&mut self, handle: OverlayHandle, at: LatLng);

    /// Detach an overlay from the canvas.
    fn remove_overlay(&mut self, handle: OverlayHandle);
}

/// User interaction reported by the canvas widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    /// Click on empty map area.
    Click(LatLng),
    /// An overlay was dropped at a new position.
    OverlayDragEnd(OverlayHandle, LatLng),
    /// Double-click / double-tap on an overlay.
    OverlayActivate(OverlayHandle),
}
