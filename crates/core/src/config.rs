//! Configuration management for Deskwatch.
//!
//! All settings come from the environment and are read once at startup into
//! an immutable [`CollectorConfig`] that is passed to the components that
//! need it.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::logging::LogFormat;

/// Default broker host (the compose service name).
pub const DEFAULT_MQTT_HOST: &str = "mosquitto";
/// Default broker port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;
/// Default subscription filter, single-level wildcard on the desk id.
pub const DEFAULT_TOPIC_FILTER: &str = "desks/+/state";
/// Default MQTT client identifier.
pub const DEFAULT_CLIENT_ID: &str = "collector";
/// Default MQTT keep-alive interval.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);
/// Longest keep-alive the CONNECT packet can carry.
pub const MAX_KEEP_ALIVE_SECS: u64 = u16::MAX as u64;
/// Default limit on a single MQTT packet, in bytes, in either direction.
pub const DEFAULT_MAX_PACKET_BYTES: usize = 1024 * 1024;
/// Default bound on a single forward request.
pub const DEFAULT_INGEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Default time allowed for in-flight work at shutdown.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub topic_filter: String,
    pub client_id: String,
    pub keep_alive: Duration,
    /// Larger packets are a protocol error and cost the connection.
    pub max_packet_bytes: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MQTT_HOST.to_string(),
            port: DEFAULT_MQTT_PORT,
            topic_filter: DEFAULT_TOPIC_FILTER.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            keep_alive: DEFAULT_KEEP_ALIVE,
            max_packet_bytes: DEFAULT_MAX_PACKET_BYTES,
        }
    }
}

/// Downstream ingest endpoint settings.
///
/// Present only when an ingest URL is configured; its absence means the
/// collector runs in local-only mode.
#[derive(Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl IngestConfig {
    /// Endpoint without a bearer token and with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            timeout: DEFAULT_INGEST_TIMEOUT,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// The token must never reach the logs.
impl fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Complete process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    pub mqtt: MqttConfig,
    pub ingest: Option<IngestConfig>,
    pub shutdown_grace: Duration,
    pub log_format: LogFormat,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig::default(),
            ingest: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            log_format: LogFormat::default(),
        }
    }
}

impl CollectorConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mqtt = MqttConfig {
            host: get("MQTT_HOST").unwrap_or_else(|| DEFAULT_MQTT_HOST.to_string()),
            port: parse_or(get("MQTT_PORT"), "MQTT_PORT", DEFAULT_MQTT_PORT)?,
            topic_filter: get("MQTT_TOPIC").unwrap_or_else(|| DEFAULT_TOPIC_FILTER.to_string()),
            client_id: get("MQTT_CLIENT_ID").unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            keep_alive: keep_alive_or(get("MQTT_KEEPALIVE_SECS"), DEFAULT_KEEP_ALIVE)?,
            max_packet_bytes: positive_or(
                get("MQTT_MAX_PACKET_BYTES"),
                "MQTT_MAX_PACKET_BYTES",
                DEFAULT_MAX_PACKET_BYTES,
            )?,
        };

        let timeout = secs_or(
            get("INGEST_TIMEOUT_SECS"),
            "INGEST_TIMEOUT_SECS",
            DEFAULT_INGEST_TIMEOUT,
        )?;
        let ingest = get("INGEST_URL")
            .or_else(|| get("EC2_INGEST_URL"))
            .map(|url| IngestConfig {
                url,
                token: get("INGEST_TOKEN").or_else(|| get("EC2_TOKEN")),
                timeout,
            });

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            mqtt,
            ingest,
            shutdown_grace: secs_or(
                get("SHUTDOWN_GRACE_SECS"),
                "SHUTDOWN_GRACE_SECS",
                DEFAULT_SHUTDOWN_GRACE,
            )?,
            log_format,
        })
    }

    /// Whether accepted messages are relayed downstream.
    pub fn forwarding_enabled(&self) -> bool {
        self.ingest.is_some()
    }
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(e) => Err(ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        },
    }
}

fn positive_or(raw: Option<String>, key: &'static str, default: usize) -> ConfigResult<usize> {
    let value = parse_or(raw.clone(), key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn secs_or(raw: Option<String>, key: &'static str, default: Duration) -> ConfigResult<Duration> {
    let secs = parse_or(raw.clone(), key, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
            reason: "must be at least one second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn keep_alive_or(raw: Option<String>, default: Duration) -> ConfigResult<Duration> {
    const KEY: &str = "MQTT_KEEPALIVE_SECS";
    let keep_alive = secs_or(raw.clone(), KEY, default)?;
    if keep_alive.as_secs() > MAX_KEEP_ALIVE_SECS {
        return Err(ConfigError::Invalid {
            key: KEY,
            value: raw.unwrap_or_default(),
            reason: format!("must be at most {} seconds", MAX_KEEP_ALIVE_SECS),
        });
    }
    Ok(keep_alive)
}
