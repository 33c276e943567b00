use serde_json::json;
use waymark::notify::LinkPayload;
use waymark::{
    Notification, RoutingError, StaleSegmentPolicy, SyncConfig, SyncError, TravelMode,
};

use crate::support::{at, Harness};

#[tokio::test]
async fn needs_two_markers() {
    let mut h = Harness::new(SyncConfig::default());

    let err = h.session.compute_next_route().await.unwrap_err();
    assert!(matches!(err, SyncError::InsufficientMarkers { count: 0 }));

    h.session.place_marker(at(1.0, 1.0)).unwrap();
    let err = h.session.compute_next_route().await.unwrap_err();
    assert!(matches!(err, SyncError::InsufficientMarkers { count: 1 }));
    assert!(err.to_string().contains("at least two markers"));

    assert!(h.router.requests().is_empty());
    assert!(h.session.routes().is_empty());
}

#[tokio::test]
async fn chain_extends_from_previous_destination() {
    let config = SyncConfig::default().with_travel_mode(TravelMode::Walking);
    let mut h = Harness::new(config);
    let a = h.session.place_marker(at(1.0, 1.0)).unwrap();
    let b = h.session.place_marker(at(2.0, 2.0)).unwrap();

    let first = h.session.compute_next_route().await.unwrap();
    assert_eq!(first.origin_marker.as_ref(), Some(&a.id));
    assert_eq!(first.destination_marker.as_ref(), Some(&b.id));

    let c = h.session.place_marker(at(3.0, 3.0)).unwrap();
    let second = h.session.compute_next_route().await.unwrap();
    assert_eq!(second.origin, first.destination);
    assert_eq!(second.destination_marker.as_ref(), Some(&c.id));

    let chain = h.session.routes();
    assert_eq!(chain.len(), 2);
    assert!(chain.is_connected());

    let requests = h.router.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.mode == TravelMode::Walking));
    assert_eq!(requests[1].origin, at(2.0, 2.0));
    assert_eq!(requests[1].destination, at(3.0, 3.0));
}

#[tokio::test]
async fn empty_chain_starts_at_second_to_last_marker() {
    let mut h = Harness::new(SyncConfig::default());
    h.session.place_marker(at(1.0, 1.0)).unwrap();
    let b = h.session.place_marker(at(2.0, 2.0)).unwrap();
    let c = h.session.place_marker(at(3.0, 3.0)).unwrap();

    let segment = h.session.compute_next_route().await.unwrap();

    assert_eq!(segment.origin_marker.as_ref(), Some(&b.id));
    assert_eq!(segment.destination_marker.as_ref(), Some(&c.id));
}

#[tokio::test]
async fn up_to_date_chain_makes_no_request() {
    let mut h = Harness::new(SyncConfig::default());
    h.session.place_marker(at(1.0, 1.0)).unwrap();
    h.session.place_marker(at(2.0, 2.0)).unwrap();
    h.session.compute_next_route().await.unwrap();

    let err = h.session.compute_next_route().await.unwrap_err();

    assert!(matches!(err, SyncError::ChainUpToDate(_)));
    assert_eq!(h.router.requests().len(), 1);
    assert_eq!(h.session.routes().len(), 1);
}

#[tokio::test]
async fn moved_last_marker_gets_a_new_leg() {
    let mut h = Harness::new(SyncConfig::default());
    h.session.place_marker(at(1.0, 1.0)).unwrap();
    let b = h.session.place_marker(at(2.0, 2.0)).unwrap();
    h.session.compute_next_route().await.unwrap();

    h.session.move_marker(&b.id, at(2.5, 2.5)).unwrap();
    let segment = h.session.compute_next_route().await.unwrap();

    assert_eq!(segment.origin, at(2.0, 2.0));
    assert_eq!(segment.destination, at(2.5, 2.5));
    assert!(h.session.routes().is_connected());
}

#[tokio::test]
async fn routing_failure_leaves_chain_untouched() {
    let mut h = Harness::new(SyncConfig::default());
    h.router
        .then(Err(RoutingError::NoRoute("ZERO_RESULTS".into())))
        .then(Ok(json!({ "leg": 1 })));
    h.session.place_marker(at(1.0, 1.0)).unwrap();
    h.session.place_marker(at(2.0, 2.0)).unwrap();

    let err = h.session.compute_next_route().await.unwrap_err();
    assert!(matches!(err, SyncError::RoutingFailed(ref reason) if reason.contains("ZERO_RESULTS")));
    assert!(h.session.routes().is_empty());

    // Same inputs, same request
    let segment = h.session.compute_next_route().await.unwrap();
    assert_eq!(segment.result, json!({ "leg": 1 }));
    let requests = h.router.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}

#[tokio::test]
async fn transient_routing_failure_is_retried_once() {
    let mut h = Harness::new(SyncConfig::default());
    h.router.then(Err(RoutingError::Transport("reset".into())));
    h.session.place_marker(at(1.0, 1.0)).unwrap();
    h.session.place_marker(at(2.0, 2.0)).unwrap();

    h.session.compute_next_route().await.unwrap();

    assert_eq!(h.router.requests().len(), 2);
    assert_eq!(h.session.routes().len(), 1);
}

#[tokio::test]
async fn each_segment_sends_create_link() {
    let mut h = Harness::new(SyncConfig::default());
    let a = h.session.place_marker(at(1.0, 1.0)).unwrap();
    let b = h.session.place_marker(at(2.0, 2.0)).unwrap();
    h.session.compute_next_route().await.unwrap();
    h.session.settle().await;

    let links: Vec<_> = h
        .sent()
        .into_iter()
        .filter_map(|n| match n {
            Notification::CreateLink(link) => Some(link),
            _ => None,
        })
        .collect();
    assert_eq!(
        links,
        vec![LinkPayload {
            from: at(1.0, 1.0),
            to: at(2.0, 2.0),
            from_id: Some(a.id),
            to_id: Some(b.id),
        }]
    );
}

#[tokio::test]
async fn retained_segments_survive_marker_removal() {
    let mut h = Harness::new(SyncConfig::default());
    let a = h.session.place_marker(at(1.0, 1.0)).unwrap();
    h.session.place_marker(at(2.0, 2.0)).unwrap();
    h.session.compute_next_route().await.unwrap();

    h.session.remove_marker(&a.id).unwrap();

    assert_eq!(h.session.routes().len(), 1);
    assert_eq!(h.session.routes().segments()[0].origin_marker.as_ref(), Some(&a.id));
}

#[tokio::test]
async fn truncate_drops_segments_from_removed_marker_on() {
    let config = SyncConfig::default().with_stale_segments(StaleSegmentPolicy::Truncate);
    let mut h = Harness::new(config);
    h.session.place_marker(at(1.0, 1.0)).unwrap();
    let b = h.session.place_marker(at(2.0, 2.0)).unwrap();
    h.session.compute_next_route().await.unwrap();
    let c = h.session.place_marker(at(3.0, 3.0)).unwrap();
    h.session.compute_next_route().await.unwrap();
    h.session.place_marker(at(4.0, 4.0)).unwrap();
    h.session.compute_next_route().await.unwrap();
    assert_eq!(h.session.routes().len(), 3);

    // c ends leg 1 and starts leg 2
    h.session.remove_marker(&c.id).unwrap();

    assert_eq!(h.session.routes().len(), 1);
    assert_eq!(
        h.session.routes().segments()[0].destination_marker.as_ref(),
        Some(&b.id)
    );
}
