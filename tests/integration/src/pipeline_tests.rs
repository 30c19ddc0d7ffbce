//! Accepted and rejected messages flowing through to a live mock endpoint

use std::sync::Mutex;

use async_trait::async_trait;
use deskwatch_collector::{BusError, BusHandler, MessageOutcome, Rejection, Subscriber};
use deskwatch_core::IngestConfig;
use deskwatch_forwarder::ForwardOutcome;
use deskwatch_schema::{unix_now, RejectReason};
use serde_json::json;

use crate::test_utils::*;

#[tokio::test]
async fn test_valid_message_reaches_ingest_with_timestamp() {
    init_logging();
    let (mock, url) = start_mock_ingest().await;
    let controller = controller_for(IngestConfig::new(&url).with_token("token"));
    let before = unix_now();

    let outcome = controller
        .handle("desks/D01/state", br#"{"occupied": true, "noise_band": 1}"#)
        .await;
    assert_eq!(
        outcome,
        MessageOutcome::Forwarded(ForwardOutcome::Delivered { status: 200 })
    );

    let received = mock.received();
    assert_eq!(received.len(), 1);
    let request = &received[0];
    assert_eq!(request.path, "/ingest");
    assert_eq!(request.authorization.as_deref(), Some("Bearer token"));

    let envelope = &request.body;
    assert_eq!(envelope["topic"], json!("desks/D01/state"));
    let payload = envelope["payload"].as_object().unwrap();
    assert_eq!(payload["occupied"], json!(true));
    assert_eq!(payload["noise_band"], json!(1));
    assert!(!payload.contains_key("desk_id"));
    assert!(payload["ts"].as_u64().unwrap() >= before);
}

#[tokio::test]
async fn test_device_fields_are_forwarded_unchanged() {
    init_logging();
    let (mock, url) = start_mock_ingest().await;
    let controller = controller_for(IngestConfig::new(&url));

    let published = json!({
        "desk_id": "B-204",
        "occupied": false,
        "noise_band": 0,
        "ts": 1_700_000_000u64,
        "firmware": "2.1.0",
        "rssi": -67
    });
    let outcome = controller
        .handle("desks/B-204/state", published.to_string().as_bytes())
        .await;
    assert!(outcome.is_accepted());

    let received = mock.received();
    assert_eq!(received[0].body["payload"], published);
    assert_eq!(received[0].authorization, None);
}

#[tokio::test]
async fn test_rejected_messages_never_reach_ingest() {
    init_logging();
    let (mock, url) = start_mock_ingest().await;
    let controller = controller_for(IngestConfig::new(&url));

    let cases: [(&str, &[u8], Rejection); 6] = [
        (
            "desks/D01",
            br#"{"occupied": true, "noise_band": 1}"#,
            Rejection::Schema(RejectReason::InvalidTopic),
        ),
        (
            "desks/D01/state",
            br#"{"occupied": "yes", "noise_band": 1}"#,
            Rejection::Schema(RejectReason::TypeMismatch {
                field: "occupied",
                expected: "boolean",
            }),
        ),
        (
            "desks/D01/state",
            br#"{"desk_id": "D02", "occupied": true, "noise_band": 0}"#,
            Rejection::Schema(RejectReason::DeskIdMismatch),
        ),
        (
            "desks/D01/state",
            br#"{"noise_band": 1}"#,
            Rejection::Schema(RejectReason::MissingFields),
        ),
        (
            "desks/D01/state",
            b"[1,2]",
            Rejection::Schema(RejectReason::MissingFields),
        ),
        (
            "desks/D01",
            b"null",
            Rejection::Schema(RejectReason::InvalidTopic),
        ),
    ];

    for (topic, payload, expected) in cases {
        let outcome = controller.handle(topic, payload).await;
        assert_eq!(outcome, MessageOutcome::Rejected(expected));
    }

    let outcome = controller.handle("desks/D01/state", b"occupied=1").await;
    assert!(matches!(outcome, MessageOutcome::Rejected(Rejection::Decode(_))));

    assert!(mock.received().is_empty());
}

#[tokio::test]
async fn test_bus_handler_entry_point_forwards_in_order() {
    init_logging();
    let (mock, url) = start_mock_ingest().await;
    let controller = controller_for(IngestConfig::new(&url));

    for desk in ["D01", "D02", "D03"] {
        let topic = format!("desks/{desk}/state");
        controller
            .on_message(&topic, br#"{"occupied": true, "noise_band": 2}"#)
            .await;
    }

    let topics: Vec<String> = mock
        .received()
        .iter()
        .map(|r| r.body["topic"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        topics,
        vec!["desks/D01/state", "desks/D02/state", "desks/D03/state"]
    );
}

#[derive(Default)]
struct BrokerSession {
    subscriptions: Mutex<Vec<String>>,
}

#[async_trait]
impl Subscriber for BrokerSession {
    async fn subscribe(&self, filter: &str) -> Result<(), BusError> {
        self.subscriptions.lock().unwrap().push(filter.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_every_connect_resubscribes_and_ingestion_resumes() {
    init_logging();
    let (mock, url) = start_mock_ingest().await;
    let controller = controller_for(IngestConfig::new(&url));
    let session = BrokerSession::default();
    let valid = br#"{"occupied": true, "noise_band": 0}"#;

    controller.on_connected(&session).await;
    controller.on_message("desks/D01/state", valid).await;

    // Broker dropped us; the clean session has no subscriptions left.
    controller.on_connected(&session).await;
    controller.on_message("desks/D02/state", valid).await;

    assert_eq!(
        *session.subscriptions.lock().unwrap(),
        vec![TOPIC_FILTER.to_string(), TOPIC_FILTER.to_string()]
    );
    assert_eq!(mock.received().len(), 2);
}
