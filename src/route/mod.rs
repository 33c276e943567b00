//! Routes - the ordered chain of travel segments between markers.
//!
//! - `RoutingService` - external directions API (collaborator)
//! - `RouteChain` / `RouteSegment` - append-only, connected leg list
//! - `RouteChainBuilder` - picks the next origin/destination and extends the chain
//! - `StraightLineRouter` - offline great-circle router
//! - `HttpRoutingService` - JSON-over-HTTP client (requires the `http` feature)

mod builder;
mod chain;
#[cfg(feature = "http")]
mod http;
mod straight_line;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geo::LatLng;
use crate::policy::Retryable;

pub use builder::{RouteChainBuilder, RoutePlan};
pub use chain::{RouteChain, RouteSegment, StaleSegmentPolicy};
#[cfg(feature = "http")]
pub use http::HttpRoutingService;
pub use straight_line::StraightLineRouter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

/// Body sent to the routing service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub origin: LatLng,
    pub destination: LatLng,
    pub mode: TravelMode,
}

/// Wire answer of the routing service: `{"status":"ok","route":...}` or
/// `{"status":"error","reason":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RouteResponse {
    Ok { route: serde_json::Value },
    Error { reason: String },
}

impl RouteResponse {
    pub fn into_result(self) -> Result<serde_json::Value, RoutingError> {
        match self {
            RouteResponse::Ok { route } => Ok(route),
            RouteResponse::Error { reason } => Err(RoutingError::NoRoute(reason)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// The service answered but found no route (or refused the request).
    NoRoute(String),
    /// Connection or HTTP-level failure.
    Transport(String),
    /// Response body could not be decoded.
    Decode(String),
    /// No answer within the policy timeout.
    Timeout(Duration),
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::NoRoute(reason) => write!(f, "no route: {}", reason),
            RoutingError::Transport(msg) => write!(f, "routing transport error: {}", msg),
            RoutingError::Decode(msg) => write!(f, "routing response decode error: {}", msg),
            RoutingError::Timeout(after) => write!(f, "routing timed out after {:?}", after),
        }
    }
}

impl std::error::Error for RoutingError {}

impl Retryable for RoutingError {
    fn is_transient(&self) -> bool {
        matches!(self, RoutingError::Transport(_) | RoutingError::Timeout(_))
    }

    fn timed_out(after: Duration) -> Self {
        RoutingError::Timeout(after)
    }
}

/// Directions provider.
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Compute a route; the returned value is opaque to the engine.
    async fn route(&self, request: &RouteRequest) -> Result<serde_json::Value, RoutingError>;
}
