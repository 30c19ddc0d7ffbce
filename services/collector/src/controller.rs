//! Ingestion controller.
//!
//! Drives one message at a time through decode, schema check, enrichment and,
//! when an ingest endpoint is configured, forwarding. Every failure is local to
//! the message: it is logged and the message is dropped.

use std::sync::Arc;

use async_trait::async_trait;
use deskwatch_core::CollectorConfig;
use deskwatch_forwarder::{
    ForwardEnvelope, ForwardError, ForwardOutcome, HttpForwarder, TelemetrySink,
};
use deskwatch_schema::{check, enrich, RejectReason};
use tracing::{error, info, warn};

use crate::bus::{BusHandler, Subscriber};
use crate::decode::{decode_payload, DecodeError};

/// Why a message was dropped before forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Bytes were not well-formed UTF-8 JSON.
    Decode(DecodeError),
    /// Decoded object failed the schema.
    Schema(RejectReason),
}

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Dropped.
    Rejected(Rejection),
    /// Accepted in local-only mode; nothing was sent.
    Accepted,
    /// Accepted and handed to the sink.
    Forwarded(ForwardOutcome),
}

impl MessageOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, MessageOutcome::Rejected(_))
    }
}

/// Owns the subscription filter and the optional downstream sink.
pub struct IngestController {
    topic_filter: String,
    sink: Option<Arc<dyn TelemetrySink>>,
}

impl IngestController {
    pub fn new(topic_filter: impl Into<String>, sink: Option<Arc<dyn TelemetrySink>>) -> Self {
        Self {
            topic_filter: topic_filter.into(),
            sink,
        }
    }

    /// Build from process configuration, with an HTTP sink when an ingest
    /// URL is configured.
    pub fn from_config(config: &CollectorConfig) -> Result<Self, ForwardError> {
        let sink = match &config.ingest {
            Some(ingest) => {
                Some(Arc::new(HttpForwarder::new(ingest.clone())?) as Arc<dyn TelemetrySink>)
            }
            None => None,
        };
        Ok(Self::new(config.mqtt.topic_filter.clone(), sink))
    }

    pub fn topic_filter(&self) -> &str {
        &self.topic_filter
    }

    /// Where accepted telemetry goes, or `None` in local-only mode.
    pub fn forward_target(&self) -> Option<&str> {
        self.sink.as_deref().map(|sink| sink.target())
    }

    /// Process one message end to end.
    pub async fn handle(&self, topic: &str, payload: &[u8]) -> MessageOutcome {
        let record = match decode_payload(payload) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    topic,
                    reason = %e,
                    code = e.code(),
                    payload = %String::from_utf8_lossy(payload),
                    "Reject"
                );
                return MessageOutcome::Rejected(Rejection::Decode(e));
            }
        };

        let telemetry = match check(topic, &record) {
            Ok(telemetry) => telemetry,
            Err(reason) => {
                warn!(
                    topic,
                    reason = %reason,
                    code = reason.code(),
                    payload = %record.as_value(),
                    "Reject"
                );
                return MessageOutcome::Rejected(Rejection::Schema(reason));
            }
        };

        let envelope = ForwardEnvelope::new(topic, enrich(telemetry));
        info!(topic, payload = %envelope.payload, "OK");

        match &self.sink {
            Some(sink) => MessageOutcome::Forwarded(sink.forward(&envelope).await),
            None => MessageOutcome::Accepted,
        }
    }
}

#[async_trait]
impl BusHandler for IngestController {
    async fn on_connected(&self, subscriber: &dyn Subscriber) {
        match subscriber.subscribe(&self.topic_filter).await {
            Ok(()) => info!(filter = %self.topic_filter, "Subscribed to topic"),
            Err(e) => error!(filter = %self.topic_filter, error = %e, "Subscribe failed"),
        }
    }

    async fn on_message(&self, topic: &str, payload: &[u8]) {
        self.handle(topic, payload).await;
    }
}
