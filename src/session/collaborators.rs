use std::sync::Arc;

use crate::notify::{LogSink, NotificationSink};
use crate::remote::{InMemoryMarkerRepository, MarkerRepository};
use crate::route::{RoutingService, StraightLineRouter};

/// External services a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub remote: Arc<dyn MarkerRepository>,
    pub notifier: Arc<dyn NotificationSink>,
    pub router: Arc<dyn RoutingService>,
}

impl Collaborators {
    pub fn new(
        remote: Arc<dyn MarkerRepository>,
        notifier: Arc<dyn NotificationSink>,
        router: Arc<dyn RoutingService>,
    ) -> Self {
        Collaborators {
            remote,
            notifier,
            router,
        }
    }

    /// Fully in-process setup: in-memory store, tracing sink, straight-line router.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryMarkerRepository::new()),
            Arc::new(LogSink::new()),
            Arc::new(StraightLineRouter::new()),
        )
    }

    /// HTTP adapters for every configured endpoint, in-process ones otherwise.
    #[cfg(feature = "http")]
    pub fn from_endpoints(endpoints: &crate::config::Endpoints) -> Self {
        use crate::notify::WebhookSink;
        use crate::remote::HttpMarkerRepository;
        use crate::route::HttpRoutingService;

        let mut collaborators = Self::in_memory();
        let client = reqwest::Client::new();
        if let Some(url) = &endpoints.store_url {
            collaborators.remote = Arc::new(HttpMarkerRepository::with_client(client.clone(), url));
        }
        if let Some(url) = &endpoints.webhook_url {
            collaborators.notifier = Arc::new(WebhookSink::with_client(client.clone(), url));
        }
        if let Some(url) = &endpoints.routing_url {
            collaborators.router = Arc::new(HttpRoutingService::with_client(client, url));
        }
        collaborators
    }

    pub fn with_remote(mut self, remote: Arc<dyn MarkerRepository>) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_router(mut self, router: Arc<dyn RoutingService>) -> Self {
        self.router = router;
        self
    }
}
