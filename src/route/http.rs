use async_trait::async_trait;

use super::{RouteRequest, RouteResponse, RoutingError, RoutingService};

/// Routing service reached with `POST {url}` and a JSON [`RouteRequest`] body.
#[derive(Debug, Clone)]
pub struct HttpRoutingService {
    client: reqwest::Client,
    url: String,
}

impl HttpRoutingService {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        HttpRoutingService {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RoutingService for HttpRoutingService {
    async fn route(&self, request: &RouteRequest) -> Result<serde_json::Value, RoutingError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| RoutingError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(RoutingError::Transport(format!("status {}", status)));
        }

        // 4xx bodies still carry {"status":"error","reason":...}
        let body: RouteResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::Decode(e.to_string()))?;
        body.into_result()
    }
}
