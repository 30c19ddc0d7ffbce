//! MQTT bus driver.
//!
//! Polls the `rumqttc` event loop and turns broker events into calls on a
//! [`BusHandler`]: `on_connected` after every successful CONNACK, and
//! `on_message` for every PUBLISH. Messages are handled one at a time, in
//! delivery order. Connection errors are retried with exponential backoff;
//! polling again after an error makes `rumqttc` reconnect.

use std::time::Duration;

use async_trait::async_trait;
use deskwatch_core::MqttConfig;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Capacity of the request channel between the client handle and the event loop.
const REQUEST_CHANNEL_CAPACITY: usize = 16;
/// First reconnect delay.
pub const RECONNECT_MIN_DELAY: Duration = Duration::from_secs(1);
/// Upper bound on the reconnect delay.
pub const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);
/// Time allowed for the DISCONNECT packet to leave at shutdown.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors from the MQTT client.
#[derive(Debug, Error)]
pub enum BusError {
    /// Request could not be queued to the event loop
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),
}

/// Something that can (re)establish topic subscriptions.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Subscribe to a topic filter.
    async fn subscribe(&self, filter: &str) -> Result<(), BusError>;
}

#[async_trait]
impl Subscriber for AsyncClient {
    async fn subscribe(&self, filter: &str) -> Result<(), BusError> {
        AsyncClient::subscribe(self, filter, QoS::AtMostOnce).await?;
        Ok(())
    }
}

/// Receiver of bus lifecycle and message events.
#[async_trait]
pub trait BusHandler: Send + Sync {
    /// Called after each successful connect, including reconnects.
    async fn on_connected(&self, subscriber: &dyn Subscriber);

    /// Called once per inbound message. Must not fail.
    async fn on_message(&self, topic: &str, payload: &[u8]);
}

/// Exponential reconnect delay, doubling from `min` up to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max, next: min }
    }

    /// Delay to wait before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.next = self.min;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(RECONNECT_MIN_DELAY, RECONNECT_MAX_DELAY)
    }
}

/// Client options for the configured broker.
///
/// A PUBLISH larger than `max_packet_bytes` fails the read at the transport
/// layer, which drops the connection and goes through the reconnect path.
pub fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
    options.set_keep_alive(config.keep_alive);
    options.set_max_packet_size(config.max_packet_bytes, config.max_packet_bytes);
    // Subscriptions are re-issued on every CONNACK.
    options.set_clean_session(true);
    options
}

/// Drive the bus until `shutdown` flips to `true` (or its sender is dropped).
pub async fn run<H>(config: &MqttConfig, handler: &H, mut shutdown: watch::Receiver<bool>)
where
    H: BusHandler + ?Sized,
{
    let (client, mut eventloop) = AsyncClient::new(mqtt_options(config), REQUEST_CHANNEL_CAPACITY);
    let mut backoff = Backoff::default();

    info!(host = %config.host, port = config.port, "Connecting to MQTT broker");

    while !*shutdown.borrow() {
        let event = tokio::select! {
            _ = shutdown.changed() => break,
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    backoff.reset();
                    info!(host = %config.host, port = config.port, "Connected to MQTT broker");
                    handler.on_connected(&client).await;
                } else {
                    warn!(code = ?ack.code, "MQTT connect refused");
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                handler.on_message(&publish.topic, &publish.payload).await;
            }
            Ok(_) => {}
            Err(e) => {
                let delay = backoff.next_delay();
                warn!(
                    host = %config.host,
                    port = config.port,
                    error = %e,
                    retry_in_secs = delay.as_secs(),
                    "MQTT connection error"
                );
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    disconnect(&client, &mut eventloop).await;
}

async fn disconnect(client: &AsyncClient, eventloop: &mut EventLoop) {
    if let Err(e) = client.disconnect().await {
        debug!(error = %e, "Disconnect request not queued");
        return;
    }

    let flushed = tokio::time::timeout(DISCONNECT_TIMEOUT, async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    })
    .await;

    match flushed {
        Ok(()) => info!("Disconnected from MQTT broker"),
        Err(_) => debug!("Broker did not acknowledge disconnect in time"),
    }
}
