mod config;
mod error;
mod geo;
pub mod marker;
pub mod notify;
pub mod overlay;
mod policy;
pub mod remote;
pub mod route;
mod session;

pub use config::{ConfigError, Endpoints, MapView, SyncConfig};
pub use error::SyncError;
pub use geo::LatLng;
pub use marker::{Marker, MarkerId, MarkerStore};
pub use notify::{LogSink, Notification, NotificationSink, NotifyError};
pub use overlay::{Canvas, CanvasEvent, InMemoryCanvas, OverlayHandle, OverlayReconciler};
pub use policy::{NetworkPolicy, Retryable};
pub use remote::{InMemoryMarkerRepository, MarkerRecord, MarkerRepository, RemoteError};
pub use route::{
    RouteChain, RouteChainBuilder, RouteSegment, RoutingError, RoutingService,
    StaleSegmentPolicy, StraightLineRouter, TravelMode,
};
pub use session::{Collaborators, MapSession, SyncStats, WriteOp};

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
