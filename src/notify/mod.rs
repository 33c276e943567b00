//! Notify - side-channel events for downstream consumers.
//!
//! Notifications are fire-and-forget: a failed delivery is logged and
//! counted, never retried beyond the network policy, never rolled back.
//!
//! - `NotificationSink` - delivery port
//! - `LogSink` - tracing output or a shared buffer
//! - `WebhookSink` - JSON `POST` to an HTTP endpoint (requires the `http` feature)
//! - `LocalEmitterSink` - in-process event emitter (requires the `emitter` feature)
//!
//! ## Wire format
//!
//! ```json
//! { "event": "createActor", "payload": { "id": "...", "lat": 1.0, "lng": 2.0 } }
//! { "event": "createLink", "payload": { "from": {...}, "to": {...}, "fromId": "...", "toId": "..." } }
//! ```

#[cfg(feature = "emitter")]
mod emitter;
mod log_sink;
#[cfg(feature = "http")]
mod webhook;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geo::LatLng;
use crate::marker::{Marker, MarkerId};
use crate::policy::Retryable;
use crate::route::RouteSegment;

#[cfg(feature = "emitter")]
pub use emitter::LocalEmitterSink;
pub use log_sink::LogSink;
#[cfg(feature = "http")]
pub use webhook::WebhookSink;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorPayload {
    pub id: MarkerId,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPayload {
    pub from: LatLng,
    pub to: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_id: Option<MarkerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_id: Option<MarkerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum Notification {
    #[serde(rename = "createActor")]
    CreateActor(ActorPayload),
    #[serde(rename = "createLink")]
    CreateLink(LinkPayload),
}

impl Notification {
    pub fn actor_created(marker: &Marker) -> Self {
        Notification::CreateActor(ActorPayload {
            id: marker.id.clone(),
            lat: marker.lat,
            lng: marker.lng,
        })
    }

    pub fn link_created(segment: &RouteSegment) -> Self {
        Notification::CreateLink(LinkPayload {
            from: segment.origin,
            to: segment.destination,
            from_id: segment.origin_marker.clone(),
            to_id: segment.destination_marker.clone(),
        })
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Notification::CreateActor(_) => "createActor",
            Notification::CreateLink(_) => "createLink",
        }
    }

    /// Rewrite marker ids carried by the payload. Returns whether anything changed.
    pub fn rename_marker(&mut self, from: &MarkerId, to: &MarkerId) -> bool {
        let mut changed = false;
        let mut swap = |slot: &mut MarkerId| {
            if slot == from {
                *slot = to.clone();
                changed = true;
            }
        };
        match self {
            Notification::CreateActor(actor) => swap(&mut actor.id),
            Notification::CreateLink(link) => {
                if let Some(id) = link.from_id.as_mut() {
                    swap(id);
                }
                if let Some(id) = link.to_id.as_mut() {
                    swap(id);
                }
            }
        }
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    Transport(String),
    /// Endpoint answered with a non-2xx status.
    Status(u16),
    Encode(String),
    Timeout(Duration),
    BufferPoisoned,
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::Transport(msg) => write!(f, "notification transport error: {}", msg),
            NotifyError::Status(code) => write!(f, "notification endpoint answered {}", code),
            NotifyError::Encode(msg) => write!(f, "notification encode error: {}", msg),
            NotifyError::Timeout(after) => write!(f, "notification timed out after {:?}", after),
            NotifyError::BufferPoisoned => write!(f, "notification buffer poisoned"),
        }
    }
}

impl std::error::Error for NotifyError {}

impl Retryable for NotifyError {
    fn is_transient(&self) -> bool {
        match self {
            NotifyError::Transport(_) | NotifyError::Timeout(_) => true,
            NotifyError::Status(code) => *code >= 500,
            _ => false,
        }
    }

    fn timed_out(after: Duration) -> Self {
        NotifyError::Timeout(after)
    }
}

/// Delivery port for notifications. The response body is ignored.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}
