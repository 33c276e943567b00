use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{Canvas, OverlayHandle};
use crate::geo::LatLng;
use crate::marker::{Marker, MarkerId};

#[derive(Debug, Clone, Copy)]
struct Attached {
    handle: OverlayHandle,
    position: LatLng,
}

/// Counts of canvas calls made by one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub moved: usize,
    pub removed: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        *self == ReconcileReport::default()
    }
}

/// Keeps exactly one live overlay per marker.
///
/// The marker <-> overlay association lives here, in two lookup tables, and
/// not on the marker record. Canvas callbacks resolve their handle through
/// [`marker_for`](Self::marker_for); coordinates are never used for lookup.
pub struct OverlayReconciler<C> {
    canvas: C,
    by_marker: HashMap<MarkerId, Attached>,
    by_handle: HashMap<OverlayHandle, MarkerId>,
}

impl<C> OverlayReconciler<C> {
    pub fn new(canvas: C) -> Self {
        OverlayReconciler {
            canvas,
            by_marker: HashMap::new(),
            by_handle: HashMap::new(),
        }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn marker_for(&self, handle: OverlayHandle) -> Option<&MarkerId> {
        self.by_handle.get(&handle)
    }

    pub fn handle_for(&self, id: &MarkerId) -> Option<OverlayHandle> {
        self.by_marker.get(id).map(|attached| attached.handle)
    }

    /// Number of overlays currently attached.
    pub fn len(&self) -> usize {
        self.by_marker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_marker.is_empty()
    }

    /// Re-key an overlay after its marker's placeholder id was resolved.
    pub fn rename(&mut self, from: &MarkerId, to: MarkerId) -> bool {
        let Some(attached) = self.by_marker.remove(from) else {
            return false;
        };
        self.by_handle.insert(attached.handle, to.clone());
        self.by_marker.insert(to, attached);
        true
    }
}

impl<C: Canvas> OverlayReconciler<C> {
    /// Bring the canvas in line with `markers`.
    ///
    /// Missing overlays are created (draggable), moved markers have their
    /// existing overlay repositioned, and overlays of markers that are gone
    /// are detached. Running it twice on the same input is a no-op.
    pub fn reconcile(&mut self, markers: &[Marker]) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let live: HashSet<&MarkerId> = markers.iter().map(|m| &m.id).collect();

        let stale: Vec<MarkerId> = self
            .by_marker
            .keys()
            .filter(|id| !live.contains(id))
            .cloned()
            .collect();
        for id in stale {
            if self.release(&id).is_some() {
                report.removed += 1;
            }
        }

        for marker in markers {
            let at = marker.position();
            match self.by_marker.get_mut(&marker.id) {
                Some(attached) => {
                    if attached.position != at {
                        self.canvas.set_overlay_position(attached.handle, at);
                        attached.position = at;
                        report.moved += 1;
                    }
                }
                None => {
                    let handle = self.canvas.create_overlay(at, true);
                    self.by_marker.insert(
                        marker.id.clone(),
                        Attached {
                            handle,
                            position: at,
                        },
                    );
                    self.by_handle.insert(handle, marker.id.clone());
                    report.created += 1;
                }
            }
        }

        if !report.is_noop() {
            debug!(
                created = report.created,
                moved = report.moved,
                removed = report.removed,
                "overlays reconciled"
            );
        }
        report
    }

    /// Detach the overlay of `id` from the canvas.
    ///
    /// Must run before the marker record is discarded; an overlay left
    /// attached stays visible but no longer resolves to a marker.
    pub fn release(&mut self, id: &MarkerId) -> Option<OverlayHandle> {
        let attached = self.by_marker.remove(id)?;
        self.by_handle.remove(&attached.handle);
        self.canvas.remove_overlay(attached.handle);
        Some(attached.handle)
    }

    /// Detach every overlay.
    pub fn release_all(&mut self) -> usize {
        let ids: Vec<MarkerId> = self.by_marker.keys().cloned().collect();
        ids.iter().filter(|id| self.release(id).is_some()).count()
    }
}
