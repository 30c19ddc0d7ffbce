//! Deskwatch Collector
//!
//! Subscribes to desk telemetry on the MQTT bus, validates and enriches each
//! message, and relays accepted messages to the ingest endpoint.

pub mod bus;
pub mod controller;
pub mod decode;

pub use bus::{BusError, BusHandler, Subscriber};
pub use controller::{IngestController, MessageOutcome, Rejection};
pub use decode::{decode_payload, DecodeError};
