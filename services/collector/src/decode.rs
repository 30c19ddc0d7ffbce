use deskwatch_schema::RawRecord;
use thiserror::Error;

/// Failure to turn raw bus bytes into a JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid UTF-8")]
    Utf8,

    #[error("invalid JSON: {0}")]
    Json(String),
}

impl DecodeError {
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::Utf8 => "invalid_utf8",
            DecodeError::Json(_) => "invalid_json",
        }
    }
}

/// Decode a payload as UTF-8 JSON text.
///
/// Any well-formed JSON value decodes; whether it is an object is a schema
/// question.
pub fn decode_payload(payload: &[u8]) -> Result<RawRecord, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::Utf8)?;
    RawRecord::from_json(text).map_err(|e| DecodeError::Json(e.to_string()))
}
