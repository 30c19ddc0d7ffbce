//! Test utilities for end-to-end pipeline tests

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Router};
use deskwatch_collector::IngestController;
use deskwatch_core::{CollectorConfig, IngestConfig};
use deskwatch_mock_ingest::MockIngest;
use deskwatch_forwarder::{HttpForwarder, TelemetrySink};
use tokio::net::TcpListener;

/// Topic filter used by every test controller
pub const TOPIC_FILTER: &str = "desks/+/state";

/// Serve a router on an ephemeral loopback port, returning its base URL
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Start a mock ingest endpoint, returning its handle and ingest URL
pub async fn start_mock_ingest() -> (MockIngest, String) {
    let mock = MockIngest::new();
    let base = serve(mock.router()).await;
    (mock, format!("{}/ingest", base))
}

/// Start an endpoint that answers every POST with the given status
pub async fn start_status_endpoint(status: StatusCode) -> String {
    let app = Router::new().route("/ingest", post(move || async move { status }));
    format!("{}/ingest", serve(app).await)
}

/// Start an endpoint that stalls longer than any test timeout
pub async fn start_stalled_endpoint() -> String {
    let app = Router::new().route(
        "/ingest",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::OK
        }),
    );
    format!("{}/ingest", serve(app).await)
}

/// URL of a loopback port with nothing listening on it
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/ingest", addr)
}

/// Controller forwarding to `ingest` over HTTP, as built by the daemon
pub fn controller_for(ingest: IngestConfig) -> IngestController {
    let config = CollectorConfig {
        ingest: Some(ingest),
        ..CollectorConfig::default()
    };
    IngestController::from_config(&config).unwrap()
}

/// Controller wrapping an explicit forwarder
pub fn controller_with_forwarder(forwarder: HttpForwarder) -> IngestController {
    IngestController::new(TOPIC_FILTER, Some(Arc::new(forwarder) as Arc<dyn TelemetrySink>))
}

/// Install a test log subscriber once per process
pub fn init_logging() {
    deskwatch_core::logging::init_for_tests();
}
