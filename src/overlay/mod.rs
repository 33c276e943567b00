//! Overlays - one live canvas object per marker.
//!
//! - `Canvas` - the map widget's overlay layer (external collaborator)
//! - `OverlayReconciler` - data-driven sync of markers onto the canvas
//! - `InMemoryCanvas` - headless canvas for tests

mod canvas;
mod in_memory;
mod reconciler;

pub use canvas::{Canvas, CanvasEvent, OverlayHandle};
pub use in_memory::{InMemoryCanvas, Overlay};
pub use reconciler::{OverlayReconciler, ReconcileReport};
