//! Deskwatch Schema
//!
//! The fixed desk telemetry schema: topic parsing, payload validation, and
//! timestamp enrichment. Everything here is pure apart from the wall-clock
//! read in [`enrich::enrich`].

#![warn(missing_docs)]

pub mod enrich;
pub mod record;
pub mod topic;
pub mod validator;

pub use enrich::{enrich, enrich_at, unix_now};
pub use record::{NoiseBand, RawRecord, ValidatedTelemetry};
pub use topic::DeskTopic;
pub use validator::{check, validate, RejectReason};
