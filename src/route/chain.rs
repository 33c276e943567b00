use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo::LatLng;
use crate::marker::MarkerId;

/// One computed leg of the itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub origin: LatLng,
    pub destination: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_marker: Option<MarkerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_marker: Option<MarkerId>,
    /// Routing service response, opaque to the engine.
    pub result: serde_json::Value,
}

impl RouteSegment {
    pub fn references(&self, id: &MarkerId) -> bool {
        self.origin_marker.as_ref() == Some(id) || self.destination_marker.as_ref() == Some(id)
    }
}

/// What happens to computed segments when a marker they reference is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleSegmentPolicy {
    /// Keep the segment; it keeps pointing at the removed marker's id and
    /// last known coordinates.
    #[default]
    Retain,
    /// Drop the first segment referencing the marker and every segment
    /// after it, so the remaining chain stays connected.
    Truncate,
}

/// Append-only, ordered list of connected segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteChain {
    segments: Vec<RouteSegment>,
}

impl RouteChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&RouteSegment> {
        self.segments.last()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Every segment starts where the previous one ended.
    pub fn is_connected(&self) -> bool {
        self.segments
            .windows(2)
            .all(|pair| pair[1].origin == pair[0].destination)
    }

    pub(crate) fn push(&mut self, segment: RouteSegment) {
        debug_assert!(
            self.last()
                .map(|tail| tail.destination == segment.origin)
                .unwrap_or(true),
            "segment does not start at the chain's endpoint"
        );
        self.segments.push(segment);
    }

    /// Drop every segment (used when all markers are deleted).
    pub fn clear(&mut self) -> Vec<RouteSegment> {
        std::mem::take(&mut self.segments)
    }

    /// Apply `policy` after `id` was removed from the marker store.
    /// Returns the number of segments dropped.
    pub fn forget_marker(&mut self, id: &MarkerId, policy: StaleSegmentPolicy) -> usize {
        let Some(first) = self.segments.iter().position(|s| s.references(id)) else {
            return 0;
        };

        match policy {
            StaleSegmentPolicy::Retain => {
                debug!(marker = %id, "route chain keeps segments of removed marker");
                0
            }
            StaleSegmentPolicy::Truncate => {
                let dropped = self.segments.len() - first;
                self.segments.truncate(first);
                debug!(marker = %id, dropped, "route chain truncated");
                dropped
            }
        }
    }

    /// Re-key marker references after a placeholder id was resolved.
    pub fn rename(&mut self, from: &MarkerId, to: &MarkerId) -> usize {
        let mut renamed = 0;
        for segment in &mut self.segments {
            for slot in [&mut segment.origin_marker, &mut segment.destination_marker] {
                if slot.as_ref() == Some(from) {
                    *slot = Some(to.clone());
                    renamed += 1;
                }
            }
        }
        renamed
    }
}
