//! Shared fixtures: a scripted router and a session wired to inspectable fakes.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use waymark::route::RouteRequest;
use waymark::{
    Collaborators, InMemoryCanvas, InMemoryMarkerRepository, LatLng, LogSink, MapSession,
    Notification, RoutingError, RoutingService, SyncConfig,
};

/// Router that answers from a script, then falls back to a fixed route.
/// Every request is recorded.
#[derive(Clone, Default)]
pub struct ScriptedRouter {
    script: Arc<Mutex<VecDeque<Result<Value, RoutingError>>>>,
    requests: Arc<Mutex<Vec<RouteRequest>>>,
}

impl ScriptedRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(&self, answer: Result<Value, RoutingError>) -> &Self {
        self.script.lock().unwrap().push_back(answer);
        self
    }

    pub fn requests(&self) -> Vec<RouteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoutingService for ScriptedRouter {
    async fn route(&self, request: &RouteRequest) -> Result<Value, RoutingError> {
        self.requests.lock().unwrap().push(*request);
        match self.script.lock().unwrap().pop_front() {
            Some(answer) => answer,
            None => Ok(json!({
                "from": [request.origin.lat, request.origin.lng],
                "to": [request.destination.lat, request.destination.lng],
            })),
        }
    }
}

/// A session plus handles on every fake it talks to.
pub struct Harness {
    pub session: MapSession<InMemoryCanvas>,
    pub remote: InMemoryMarkerRepository,
    pub router: ScriptedRouter,
    pub sent: Arc<Mutex<Vec<Notification>>>,
}

impl Harness {
    pub fn new(config: SyncConfig) -> Self {
        Self::with_remote(config, InMemoryMarkerRepository::new())
    }

    pub fn with_remote(config: SyncConfig, remote: InMemoryMarkerRepository) -> Self {
        let router = ScriptedRouter::new();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let collaborators = Collaborators::in_memory()
            .with_remote(Arc::new(remote.clone()))
            .with_notifier(Arc::new(LogSink::with_buffer(sent.clone())))
            .with_router(Arc::new(router.clone()));
        let session = MapSession::new(InMemoryCanvas::new(), collaborators, &config);

        Harness {
            session,
            remote,
            router,
            sent,
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_events(&self) -> Vec<&'static str> {
        self.sent().iter().map(Notification::event_name).collect()
    }
}

pub fn at(lat: f64, lng: f64) -> LatLng {
    LatLng::new(lat, lng)
}
