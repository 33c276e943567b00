use async_trait::async_trait;
use serde_json::json;

use super::{RouteRequest, RoutingError, RoutingService};

/// Offline router: one straight great-circle leg per request.
///
/// Useful as a default when no directions API is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct StraightLineRouter;

impl StraightLineRouter {
    pub fn new() -> Self {
        StraightLineRouter
    }
}

#[async_trait]
impl RoutingService for StraightLineRouter {
    async fn route(&self, request: &RouteRequest) -> Result<serde_json::Value, RoutingError> {
        let meters = request.origin.distance_to(&request.destination);
        Ok(json!({
            "mode": request.mode,
            "distanceMeters": meters,
            "legs": [{
                "start": request.origin,
                "end": request.destination,
                "distanceMeters": meters,
            }],
        }))
    }
}
