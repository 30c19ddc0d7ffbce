//! Desk telemetry schema validation.
//!
//! Checks run in a fixed order and stop at the first failure: topic shape,
//! required keys, `occupied` type, `noise_band` domain, `desk_id` agreement,
//! then the type of a device-supplied `ts`.

use serde_json::Value;
use thiserror::Error;

use crate::record::{
    NoiseBand, RawRecord, ValidatedTelemetry, FIELD_DESK_ID, FIELD_NOISE_BAND, FIELD_OCCUPIED,
    FIELD_TS,
};
use crate::topic::DeskTopic;

/// Why a message was refused by the schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Topic is not `desks/<device_id>/state`
    #[error("Invalid topic format")]
    InvalidTopic,

    /// `occupied` and/or `noise_band` absent
    #[error("Missing required fields: occupied and/or noise_band")]
    MissingFields,

    /// Field present with the wrong JSON type
    #[error("{field} must be {expected}")]
    TypeMismatch {
        /// Offending field
        field: &'static str,
        /// JSON type the schema requires
        expected: &'static str,
    },

    /// Field outside its discrete domain
    #[error("{0} must be int in {{0,1,2}}")]
    InvalidEnum(&'static str),

    /// `desk_id` disagrees with the topic
    #[error("desk_id mismatch between topic and payload")]
    DeskIdMismatch,

    /// `ts` present but not a non-negative integer
    #[error("ts must be a non-negative integer (unix seconds)")]
    InvalidTimestamp,
}

impl RejectReason {
    /// Stable short code for structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::InvalidTopic => "invalid_topic",
            RejectReason::MissingFields => "missing_fields",
            RejectReason::TypeMismatch { .. } => "type_mismatch",
            RejectReason::InvalidEnum(_) => "invalid_enum",
            RejectReason::DeskIdMismatch => "desk_id_mismatch",
            RejectReason::InvalidTimestamp => "invalid_timestamp",
        }
    }
}

/// Validate a topic and decoded value without producing the typed form.
pub fn validate(topic: &str, record: &RawRecord) -> Result<(), RejectReason> {
    check(topic, record).map(|_| ())
}

/// Validate a topic and decoded value, producing [`ValidatedTelemetry`].
///
/// The topic is checked before the payload, so a bad topic wins over any
/// payload defect. A value that is not a JSON object has no required fields.
/// The input is not modified; unknown fields are copied into the result.
pub fn check(topic: &str, record: &RawRecord) -> Result<ValidatedTelemetry, RejectReason> {
    let topic = DeskTopic::parse(topic)?;
    let fields = record.as_object().ok_or(RejectReason::MissingFields)?;

    let (occupied, noise_band) = match (fields.get(FIELD_OCCUPIED), fields.get(FIELD_NOISE_BAND))
    {
        (Some(occupied), Some(noise_band)) => (occupied, noise_band),
        _ => return Err(RejectReason::MissingFields),
    };

    let occupied = occupied.as_bool().ok_or(RejectReason::TypeMismatch {
        field: FIELD_OCCUPIED,
        expected: "boolean",
    })?;

    // `as_u64` is `None` for booleans, floats, and negatives.
    let noise_band = noise_band
        .as_u64()
        .and_then(NoiseBand::from_level)
        .ok_or(RejectReason::InvalidEnum(FIELD_NOISE_BAND))?;

    let desk_id = match fields.get(FIELD_DESK_ID) {
        None => None,
        Some(Value::String(id)) if id == topic.device_id() => Some(id.clone()),
        Some(_) => return Err(RejectReason::DeskIdMismatch),
    };

    let ts = match fields.get(FIELD_TS) {
        None => None,
        Some(value) => Some(value.as_u64().ok_or(RejectReason::InvalidTimestamp)?),
    };

    let extra = fields
        .iter()
        .filter(|(key, _)| {
            !matches!(
                key.as_str(),
                FIELD_OCCUPIED | FIELD_NOISE_BAND | FIELD_DESK_ID | FIELD_TS
            )
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(ValidatedTelemetry::new(desk_id, occupied, noise_band, ts, extra))
}
