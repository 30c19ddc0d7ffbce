//! Core error types

use thiserror::Error;

/// Errors raised while assembling the process configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        /// Environment variable name
        key: &'static str,
        /// Offending raw value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
