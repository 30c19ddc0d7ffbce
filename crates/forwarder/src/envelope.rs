//! Wire contract for the downstream ingest endpoint.

use deskwatch_schema::ValidatedTelemetry;
use serde::Serialize;

/// `{topic, payload}` unit posted to the ingest endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardEnvelope {
    /// Source bus topic, e.g. `desks/D01/state`.
    pub topic: String,
    /// Validated and enriched device payload.
    pub payload: ValidatedTelemetry,
}

impl ForwardEnvelope {
    /// Wrap a payload with the topic it arrived on.
    pub fn new(topic: impl Into<String>, payload: ValidatedTelemetry) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Serialize to the JSON request body.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
