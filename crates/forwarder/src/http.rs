//! HTTP forwarder backed by `reqwest`.
//!
//! One POST per accepted message, bounded by the configured timeout. Nothing
//! is retried or queued; failures end up in the returned [`ForwardOutcome`]
//! and in the logs.

use async_trait::async_trait;
use deskwatch_core::IngestConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{error, info, warn};

use crate::envelope::ForwardEnvelope;
use crate::{ForwardError, ForwardOutcome, TelemetrySink};

/// Longest response body excerpt kept for logging.
const MAX_LOGGED_BODY: usize = 512;

/// Posts envelopes to a configured ingest URL.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client,
    config: IngestConfig,
}

impl HttpForwarder {
    /// Build a forwarder whose client enforces `config.timeout` on every request.
    pub fn new(config: IngestConfig) -> Result<Self, ForwardError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ForwardError::ClientBuild)?;
        Ok(Self { client, config })
    }

    /// Endpoint this forwarder posts to.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn post(&self, envelope: &ForwardEnvelope) -> Result<ForwardOutcome, ForwardError> {
        let body = envelope.to_json_bytes()?;

        let mut request = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(ForwardOutcome::Delivered {
                status: status.as_u16(),
            });
        }

        // Best effort: an unreadable body still leaves a useful status.
        let body = response.text().await.unwrap_or_default();
        Ok(ForwardOutcome::Rejected {
            status: status.as_u16(),
            body: truncate(&body, MAX_LOGGED_BODY),
        })
    }
}

#[async_trait]
impl TelemetrySink for HttpForwarder {
    async fn forward(&self, envelope: &ForwardEnvelope) -> ForwardOutcome {
        let outcome = match self.post(envelope).await {
            Ok(outcome) => outcome,
            Err(e) => ForwardOutcome::Failed {
                error: e.to_string(),
            },
        };

        match &outcome {
            ForwardOutcome::Delivered { status } => {
                info!(
                    topic = %envelope.topic,
                    url = %self.config.url,
                    status = *status,
                    "Forwarded telemetry"
                );
            }
            ForwardOutcome::Rejected { status, body } => {
                warn!(
                    topic = %envelope.topic,
                    url = %self.config.url,
                    status = *status,
                    body = %body,
                    "Ingest endpoint returned non-success status"
                );
            }
            ForwardOutcome::Failed { error: detail } => {
                error!(
                    topic = %envelope.topic,
                    url = %self.config.url,
                    error = %detail,
                    "Forward failed"
                );
            }
        }

        outcome
    }

    fn target(&self) -> &str {
        self.url()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}
