//! Timestamp enrichment for accepted telemetry.

use chrono::Utc;

use crate::record::ValidatedTelemetry;

/// Stamp `ts` with the current unix time if the device did not send one.
pub fn enrich(telemetry: ValidatedTelemetry) -> ValidatedTelemetry {
    enrich_at(telemetry, unix_now())
}

/// Stamp `ts` with `now` if absent. A present `ts` is left untouched.
pub fn enrich_at(mut telemetry: ValidatedTelemetry, now: u64) -> ValidatedTelemetry {
    if telemetry.ts().is_none() {
        telemetry.set_ts(now);
    }
    telemetry
}

/// Current wall-clock time in whole unix seconds.
pub fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
