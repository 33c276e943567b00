use std::sync::Arc;

use tracing::{info, warn};

use super::{RouteChain, RouteRequest, RouteSegment, RoutingService, TravelMode};
use crate::error::SyncError;
use crate::marker::{Marker, MarkerId};
use crate::policy::NetworkPolicy;

/// The next leg to request, derived from the marker snapshot and the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub request: RouteRequest,
    pub origin_marker: Option<MarkerId>,
    pub destination_marker: Option<MarkerId>,
}

/// Extends a [`RouteChain`] one leg at a time.
///
/// The destination is always the newest marker. The origin is the endpoint
/// of the previous leg, or the second-newest marker while the chain is
/// empty, so repeated calls build a connected multi-leg itinerary.
pub struct RouteChainBuilder {
    chain: RouteChain,
    service: Arc<dyn RoutingService>,
    mode: TravelMode,
    policy: NetworkPolicy,
}

impl RouteChainBuilder {
    pub fn new(service: Arc<dyn RoutingService>) -> Self {
        RouteChainBuilder {
            chain: RouteChain::new(),
            service,
            mode: TravelMode::default(),
            policy: NetworkPolicy::default(),
        }
    }

    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_policy(mut self, policy: NetworkPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn chain(&self) -> &RouteChain {
        &self.chain
    }

    pub(crate) fn chain_mut(&mut self) -> &mut RouteChain {
        &mut self.chain
    }

    /// Work out the next request without calling the service.
    pub fn plan(&self, markers: &[Marker]) -> Result<RoutePlan, SyncError> {
        let count = markers.len();
        if count < 2 {
            return Err(SyncError::InsufficientMarkers { count });
        }

        let destination = &markers[count - 1];
        let (origin, origin_marker) = match self.chain.last() {
            Some(tail) => {
                if tail.destination_marker.as_ref() == Some(&destination.id)
                    && tail.destination == destination.position()
                {
                    return Err(SyncError::ChainUpToDate(destination.id.clone()));
                }
                (tail.destination, tail.destination_marker.clone())
            }
            None => {
                let previous = &markers[count - 2];
                (previous.position(), Some(previous.id.clone()))
            }
        };

        Ok(RoutePlan {
            request: RouteRequest {
                origin,
                destination: destination.position(),
                mode: self.mode,
            },
            origin_marker,
            destination_marker: Some(destination.id.clone()),
        })
    }

    /// Request the next leg and append it on success.
    ///
    /// On failure the chain is left untouched, so calling again with the
    /// same markers retries the exact same request.
    pub async fn compute_next(&mut self, markers: &[Marker]) -> Result<RouteSegment, SyncError> {
        let plan = self.plan(markers)?;
        let request = plan.request;

        let result = self
            .policy
            .run("route", || self.service.route(&request))
            .await
            .map_err(|err| {
                warn!(origin = %request.origin, destination = %request.destination, error = %err, "routing failed");
                SyncError::RoutingFailed(err.to_string())
            })?;

        let segment = RouteSegment {
            origin: request.origin,
            destination: request.destination,
            origin_marker: plan.origin_marker,
            destination_marker: plan.destination_marker,
            result,
        };
        self.chain.push(segment.clone());
        info!(
            origin = %segment.origin,
            destination = %segment.destination,
            legs = self.chain.len(),
            "route segment appended"
        );
        Ok(segment)
    }
}
