//! Mock ingest endpoint.
//!
//! Accepts any POST, logs what it received, keeps a copy for inspection, and
//! answers `{"status":"ok"}`. Used to exercise the collector's forwarding
//! path without the real downstream API.

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

/// One request as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedRequest {
    pub path: String,
    pub authorization: Option<String>,
    /// Parsed JSON body, or `{"raw": <text>}` when the body was not JSON.
    pub body: Value,
}

/// Shared handle on the mock's request log.
#[derive(Debug, Clone, Default)]
pub struct MockIngest {
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl MockIngest {
    pub fn new() -> Self {
        Self::default()
    }

    /// HTTP routes: `GET /health` and POST on any other path.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/", post(receive))
            .route("/*path", post(receive))
            .with_state(self.clone())
    }

    /// Snapshot of every request received so far.
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

async fn receive(
    State(mock): State<MockIngest>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let body = serde_json::from_str(&body).unwrap_or_else(|_| json!({ "raw": body }));
    info!(path = %uri.path(), body = %body, "RECEIVED");

    let request = ReceivedRequest {
        path: uri.path().to_string(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    };
    if let Ok(mut log) = mock.received.lock() {
        log.push(request);
    }

    Json(json!({ "status": "ok" }))
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(json!({
        "status": "healthy",
        "service": "mock-ingest",
        "timestamp": Utc::now().to_rfc3339()
    })))
}
