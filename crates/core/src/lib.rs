//! Core functionality for the Deskwatch edge collector.
//!
//! This crate provides the configuration, error, and logging plumbing shared
//! by the collector service and its supporting crates.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CollectorConfig, IngestConfig, MqttConfig};
pub use error::{ConfigError, ConfigResult};
pub use logging::LogFormat;
