//! Telemetry record types.
//!
//! A [`RawRecord`] is whatever JSON value a device published, object or not.
//! A [`ValidatedTelemetry`] can only be produced by [`crate::validator::check`],
//! so anything that reaches the forwarder has passed the schema.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field carrying the occupancy flag.
pub const FIELD_OCCUPIED: &str = "occupied";
/// Field carrying the discretized noise level.
pub const FIELD_NOISE_BAND: &str = "noise_band";
/// Optional field repeating the topic's device id.
pub const FIELD_DESK_ID: &str = "desk_id";
/// Optional unix-seconds timestamp.
pub const FIELD_TS: &str = "ts";

/// Decoded JSON as published by a device, before any schema check.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Value);

impl RawRecord {
    /// Decode any JSON value. Only malformed text is an error.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self)
    }

    /// Look up a top-level field. Always `None` for non-object values.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Top-level fields, when the value is a JSON object.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    /// The decoded value as received.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Coarse ambient noise level reported by a desk sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum NoiseBand {
    /// Level 0
    Quiet,
    /// Level 1
    Moderate,
    /// Level 2
    Loud,
}

impl NoiseBand {
    /// Map a wire value; only 0, 1 and 2 are valid.
    pub fn from_level(level: u64) -> Option<Self> {
        match level {
            0 => Some(NoiseBand::Quiet),
            1 => Some(NoiseBand::Moderate),
            2 => Some(NoiseBand::Loud),
            _ => None,
        }
    }

    /// Wire value of the band.
    pub fn level(self) -> u8 {
        match self {
            NoiseBand::Quiet => 0,
            NoiseBand::Moderate => 1,
            NoiseBand::Loud => 2,
        }
    }
}

impl From<NoiseBand> for u8 {
    fn from(band: NoiseBand) -> Self {
        band.level()
    }
}

/// Schema-checked desk telemetry.
///
/// Serializes back to the device's object shape: known fields plus every
/// unknown field the device sent, untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedTelemetry {
    #[serde(skip_serializing_if = "Option::is_none")]
    desk_id: Option<String>,
    occupied: bool,
    noise_band: NoiseBand,
    #[serde(skip_serializing_if = "Option::is_none")]
    ts: Option<u64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ValidatedTelemetry {
    pub(crate) fn new(
        desk_id: Option<String>,
        occupied: bool,
        noise_band: NoiseBand,
        ts: Option<u64>,
        extra: Map<String, Value>,
    ) -> Self {
        Self {
            desk_id,
            occupied,
            noise_band,
            ts,
            extra,
        }
    }

    /// Device id echoed in the payload, if the device sent one.
    pub fn desk_id(&self) -> Option<&str> {
        self.desk_id.as_deref()
    }

    /// Whether the desk is occupied.
    pub fn occupied(&self) -> bool {
        self.occupied
    }

    /// Reported noise band.
    pub fn noise_band(&self) -> NoiseBand {
        self.noise_band
    }

    /// Unix-seconds timestamp, if the device sent one or it was enriched.
    pub fn ts(&self) -> Option<u64> {
        self.ts
    }

    pub(crate) fn set_ts(&mut self, ts: u64) {
        self.ts = Some(ts);
    }
}

/// Compact JSON, as placed in the forward envelope.
impl fmt::Display for ValidatedTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
