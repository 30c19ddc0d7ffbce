//! Deskwatch Forwarder
//!
//! Relays accepted desk telemetry to the downstream ingest endpoint.
//! Delivery is best effort and at most once: a failed forward is logged and
//! the message is dropped.

#![warn(missing_docs)]

pub mod envelope;
pub mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use envelope::ForwardEnvelope;
pub use http::HttpForwarder;

/// Errors raised while building or issuing a forward request.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Transport-level failure (timeout, refused connection, DNS, ...)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Envelope could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of a single forward attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// Endpoint answered with a 2xx status.
    Delivered {
        /// HTTP status code
        status: u16,
    },
    /// Endpoint answered with a non-2xx status; observed, not retried.
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body excerpt
        body: String,
    },
    /// No response was obtained.
    Failed {
        /// Error detail
        error: String,
    },
}

impl ForwardOutcome {
    /// Whether the endpoint acknowledged the envelope.
    pub fn is_delivered(&self) -> bool {
        matches!(self, ForwardOutcome::Delivered { .. })
    }
}

/// Destination for accepted telemetry.
///
/// Implementations must not panic or propagate errors: every attempt ends in
/// a [`ForwardOutcome`].
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Relay one envelope.
    async fn forward(&self, envelope: &ForwardEnvelope) -> ForwardOutcome;

    /// Human-readable destination for logs.
    fn target(&self) -> &str;
}
