//! InMemoryCanvas - headless overlay layer for tests and server-side sessions.

use std::collections::BTreeMap;

use super::{Canvas, CanvasEvent, OverlayHandle};
use crate::geo::LatLng;

/// A live overlay as the canvas sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub position: LatLng,
    pub draggable: bool,
}

/// Canvas that keeps overlays in a map and counts every call.
#[derive(Debug, Default)]
pub struct InMemoryCanvas {
    overlays: BTreeMap<OverlayHandle, Overlay>,
    next_handle: u64,
    created: usize,
    moved: usize,
    removed: usize,
}

impl InMemoryCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlay(&self, handle: OverlayHandle) -> Option<&Overlay> {
        self.overlays.get(&handle)
    }

    pub fn live_overlays(&self) -> usize {
        self.overlays.len()
    }

    pub fn handles(&self) -> Vec<OverlayHandle> {
        self.overlays.keys().copied().collect()
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn moved(&self) -> usize {
        self.moved
    }

    pub fn removed(&self) -> usize {
        self.removed
    }

    /// Simulate the user dropping an overlay at `to`.
    ///
    /// Returns `None` if the handle is not attached.
    pub fn drag(&mut self, handle: OverlayHandle, to: LatLng) -> Option<CanvasEvent> {
        let overlay = self.overlays.get_mut(&handle)?;
        if !overlay.draggable {
            return None;
        }
        overlay.position = to;
        Some(CanvasEvent::OverlayDragEnd(handle, to))
    }

    /// Simulate a double-click on an overlay.
    pub fn activate(&self, handle: OverlayHandle) -> Option<CanvasEvent> {
        self.overlays
            .contains_key(&handle)
            .then_some(CanvasEvent::OverlayActivate(handle))
    }

    /// Simulate a click on empty map area.
    pub fn click(&self, at: LatLng) -> CanvasEvent {
        CanvasEvent::Click(at)
    }
}

impl Canvas for InMemoryCanvas {
    fn create_overlay(&mut self, at: LatLng, draggable: bool) -> OverlayHandle {
        self.next_handle += 1;
        let handle = OverlayHandle(self.next_handle);
        self.overlays.insert(
            handle,
            Overlay {
                position: at,
                draggable,
            },
        );
        self.created += 1;
        handle
    }

    fn set_overlay_position(&mut self, handle: OverlayHandle, at: LatLng) {
        if let Some(overlay) = self.overlays.get_mut(&handle) {
            overlay.position = at;
            self.moved += 1;
        }
    }

    fn remove_overlay(&mut self, handle: OverlayHandle) {
        if self.overlays.remove(&handle).is_some() {
            self.removed += 1;
        }
    }
}
