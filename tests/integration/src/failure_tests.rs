//! Forward failures must stay local to the message that hit them

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use deskwatch_collector::MessageOutcome;
use deskwatch_core::IngestConfig;
use deskwatch_forwarder::{ForwardOutcome, HttpForwarder};

use crate::test_utils::*;

const VALID: &[u8] = br#"{"occupied": true, "noise_band": 1}"#;

#[tokio::test]
async fn test_unreachable_endpoint_does_not_stop_ingestion() {
    init_logging();
    let controller = controller_for(IngestConfig::new(unreachable_url().await));

    for desk in ["D01", "D02", "D03"] {
        let outcome = controller.handle(&format!("desks/{desk}/state"), VALID).await;
        assert!(outcome.is_accepted());
        assert!(matches!(
            outcome,
            MessageOutcome::Forwarded(ForwardOutcome::Failed { .. })
        ));
    }
}

#[tokio::test]
async fn test_failure_then_recovery_on_new_endpoint() {
    init_logging();
    let down = controller_for(IngestConfig::new(unreachable_url().await));
    let failed = down.handle("desks/D01/state", VALID).await;
    assert!(matches!(
        failed,
        MessageOutcome::Forwarded(ForwardOutcome::Failed { .. })
    ));

    let (mock, url) = start_mock_ingest().await;
    let up = controller_for(IngestConfig::new(&url));
    let delivered = up.handle("desks/D02/state", VALID).await;
    assert_eq!(
        delivered,
        MessageOutcome::Forwarded(ForwardOutcome::Delivered { status: 200 })
    );

    // The dropped message is not replayed.
    let received = mock.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].body["topic"], "desks/D02/state");
}

#[tokio::test]
async fn test_stalled_endpoint_is_bounded_by_timeout() {
    init_logging();
    let url = start_stalled_endpoint().await;
    let forwarder =
        HttpForwarder::new(IngestConfig::new(url).with_timeout(Duration::from_millis(300)))
            .unwrap();
    let controller = controller_with_forwarder(forwarder);

    let started = Instant::now();
    let first = controller.handle("desks/D01/state", VALID).await;
    let second = controller.handle("desks/D02/state", VALID).await;

    assert!(matches!(first, MessageOutcome::Forwarded(ForwardOutcome::Failed { .. })));
    assert!(matches!(second, MessageOutcome::Forwarded(ForwardOutcome::Failed { .. })));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_non_success_status_is_observed_not_retried() {
    init_logging();
    let url = start_status_endpoint(StatusCode::INTERNAL_SERVER_ERROR).await;
    let controller = controller_for(IngestConfig::new(url));

    let outcome = controller.handle("desks/D01/state", VALID).await;
    match outcome {
        MessageOutcome::Forwarded(ForwardOutcome::Rejected { status, .. }) => {
            assert_eq!(status, 500)
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let next = controller.handle("desks/D02/state", VALID).await;
    assert!(next.is_accepted());
}
