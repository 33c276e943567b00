//! HTTP adapter tests.
//!
//! Starts axum mock servers and points the reqwest-backed adapters at them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use waymark::marker::IdentityPolicy;
use waymark::notify::WebhookSink;
use waymark::remote::HttpMarkerRepository;
use waymark::route::{HttpRoutingService, RouteRequest};
use waymark::{
    Collaborators, Endpoints, InMemoryCanvas, LatLng, MapSession, MarkerId, MarkerRecord,
    MarkerRepository, Notification, NotificationSink, NotifyError, RemoteError, RoutingError,
    RoutingService, SyncConfig, TravelMode,
};

use crate::support::at;

/// Bind to port 0 and return the actual address.
async fn start_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// =============================================================================
// Mock marker collection
// =============================================================================

#[derive(Clone, Default)]
struct Collection {
    records: Arc<Mutex<Vec<MarkerRecord>>>,
    seq: Arc<AtomicU64>,
}

impl Collection {
    fn records(&self) -> Vec<MarkerRecord> {
        self.records.lock().unwrap().clone()
    }
}

async fn list(State(c): State<Collection>) -> Json<Vec<MarkerRecord>> {
    Json(c.records())
}

async fn create(State(c): State<Collection>, Json(at): Json<LatLng>) -> Json<Value> {
    let id = format!("srv-{}", c.seq.fetch_add(1, Ordering::Relaxed) + 1);
    c.records
        .lock()
        .unwrap()
        .push(MarkerRecord::new(id.as_str(), at));
    Json(json!({ "id": id }))
}

async fn put(
    State(c): State<Collection>,
    Path(id): Path<String>,
    Json(at): Json<LatLng>,
) -> StatusCode {
    let mut records = c.records.lock().unwrap();
    records.retain(|r| r.id.as_str() != id);
    records.push(MarkerRecord::new(id, at));
    StatusCode::NO_CONTENT
}

async fn patch(
    State(c): State<Collection>,
    Path(id): Path<String>,
    Json(at): Json<LatLng>,
) -> StatusCode {
    let mut records = c.records.lock().unwrap();
    match records.iter_mut().find(|r| r.id.as_str() == id) {
        Some(record) => {
            record.lat = at.lat;
            record.lng = at.lng;
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn delete(State(c): State<Collection>, Path(id): Path<String>) -> StatusCode {
    let mut records = c.records.lock().unwrap();
    let before = records.len();
    records.retain(|r| r.id.as_str() != id);
    if records.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

fn collection_app(collection: Collection) -> Router {
    Router::new()
        .route("/markers", get(list).post(create))
        .route("/markers/:id", axum::routing::put(put).patch(patch).delete(delete))
        .with_state(collection)
}

#[tokio::test]
async fn repository_round_trip_against_rest_collection() {
    let collection = Collection::default();
    let base = start_server(collection_app(collection.clone())).await;
    let repo = HttpMarkerRepository::new(format!("{base}/markers/"));

    assert!(repo.list().await.unwrap().is_empty());

    let assigned = repo.create(None, at(1.0, 2.0)).await.unwrap();
    assert_eq!(assigned.as_str(), "srv-1");
    let chosen = MarkerId::new("mine");
    assert_eq!(repo.create(Some(&chosen), at(3.0, 4.0)).await.unwrap(), chosen);

    repo.update(&assigned, at(5.0, 6.0)).await.unwrap();
    let listed = repo.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].position(), at(5.0, 6.0));

    repo.delete(&chosen).await.unwrap();
    assert_eq!(collection.records().len(), 1);

    let ghost = MarkerId::new("ghost");
    assert_eq!(repo.delete(&ghost).await, Err(RemoteError::NotFound(ghost.clone())));
    assert_eq!(
        repo.update(&ghost, at(0.0, 0.0)).await,
        Err(RemoteError::NotFound(ghost))
    );

    assert_eq!(repo.delete_all().await.unwrap(), 1);
    assert!(collection.records().is_empty());
}

#[tokio::test]
async fn repository_maps_server_errors_to_status() {
    let app = Router::new().route("/markers", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    let base = start_server(app).await;
    let repo = HttpMarkerRepository::new(format!("{base}/markers"));

    assert_eq!(repo.list().await, Err(RemoteError::Status(503)));
}

// =============================================================================
// Webhook
// =============================================================================

type Received = Arc<Mutex<Vec<Value>>>;

async fn hook(State(received): State<Received>, Json(body): Json<Value>) -> StatusCode {
    received.lock().unwrap().push(body);
    StatusCode::ACCEPTED
}

#[tokio::test]
async fn webhook_posts_event_envelope() {
    let received: Received = Arc::default();
    let app = Router::new()
        .route("/hook", post(hook))
        .with_state(received.clone());
    let base = start_server(app).await;
    let sink = WebhookSink::new(format!("{base}/hook"));

    let marker = waymark::Marker::new(MarkerId::new("m1"), at(1.5, 2.5));
    sink.notify(&Notification::actor_created(&marker)).await.unwrap();

    let bodies = received.lock().unwrap().clone();
    assert_eq!(
        bodies,
        vec![json!({
            "event": "createActor",
            "payload": { "id": "m1", "lat": 1.5, "lng": 2.5 }
        })]
    );
}

#[tokio::test]
async fn webhook_rejection_is_a_status_error() {
    let app = Router::new().route("/hook", post(|| async { StatusCode::BAD_REQUEST }));
    let base = start_server(app).await;
    let sink = WebhookSink::new(format!("{base}/hook"));

    let marker = waymark::Marker::new(MarkerId::new("m1"), at(0.0, 0.0));
    let err = sink
        .notify(&Notification::actor_created(&marker))
        .await
        .unwrap_err();
    assert_eq!(err, NotifyError::Status(400));
}

// =============================================================================
// Routing service
// =============================================================================

async fn directions(Json(request): Json<RouteRequest>) -> (StatusCode, Json<Value>) {
    if request.origin == request.destination {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "status": "error", "reason": "NOT_FOUND" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "route": { "mode": request.mode, "summary": "via test server" }
        })),
    )
}

#[tokio::test]
async fn routing_service_parses_ok_and_error_bodies() {
    let app = Router::new().route("/directions", post(directions));
    let base = start_server(app).await;
    let service = HttpRoutingService::new(format!("{base}/directions"));

    let route = service
        .route(&RouteRequest {
            origin: at(1.0, 1.0),
            destination: at(2.0, 2.0),
            mode: TravelMode::Bicycling,
        })
        .await
        .unwrap();
    assert_eq!(route, json!({ "mode": "bicycling", "summary": "via test server" }));

    let err = service
        .route(&RouteRequest {
            origin: at(1.0, 1.0),
            destination: at(1.0, 1.0),
            mode: TravelMode::Driving,
        })
        .await
        .unwrap_err();
    assert_eq!(err, RoutingError::NoRoute("NOT_FOUND".into()));
}

#[tokio::test]
async fn routing_server_error_is_transport() {
    let app = Router::new().route("/directions", post(|| async { StatusCode::BAD_GATEWAY }));
    let base = start_server(app).await;
    let service = HttpRoutingService::new(format!("{base}/directions"));

    let err = service
        .route(&RouteRequest {
            origin: at(1.0, 1.0),
            destination: at(2.0, 2.0),
            mode: TravelMode::Driving,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RoutingError::Transport(_)));
}

// =============================================================================
// Whole session over HTTP
// =============================================================================

#[tokio::test]
async fn session_syncs_through_configured_endpoints() {
    let collection = Collection::default();
    let received: Received = Arc::default();
    let app = collection_app(collection.clone()).merge(
        Router::new()
            .route("/hook", post(hook))
            .with_state(received.clone()),
    );
    let base = start_server(app).await;

    let endpoints = Endpoints {
        store_url: Some(format!("{base}/markers")),
        webhook_url: Some(format!("{base}/hook")),
        routing_url: None,
    };
    let config = SyncConfig {
        identity: IdentityPolicy::StoreAssigned,
        endpoints: endpoints.clone(),
        ..SyncConfig::default()
    };
    let mut session = MapSession::new(
        InMemoryCanvas::new(),
        Collaborators::from_endpoints(&endpoints),
        &config,
    );

    let a = session.place_marker(at(1.0, 1.0)).unwrap();
    session.move_marker(&a.id, at(1.5, 1.5)).unwrap();
    session.place_marker(at(2.0, 2.0)).unwrap();
    session.compute_next_route().await.unwrap();
    session.settle().await;

    let mut ids: Vec<_> = session.markers().iter().map(|m| m.id.to_string()).collect();
    ids.sort();
    assert_eq!(ids, vec!["srv-1", "srv-2"]);
    assert!(session.take_alerts().is_empty());

    let stored = collection.records();
    assert_eq!(stored.len(), 2);
    let first = stored
        .iter()
        .find(|r| r.id == session.markers()[0].id)
        .unwrap();
    assert_eq!(first.position(), at(1.5, 1.5));

    let events: Vec<_> = received
        .lock()
        .unwrap()
        .iter()
        .map(|body| body["event"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(events.iter().filter(|e| *e == "createActor").count(), 2);
    assert_eq!(events.iter().filter(|e| *e == "createLink").count(), 1);
}
