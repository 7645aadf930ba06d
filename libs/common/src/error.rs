//! Custom error types for the common library
//!
//! This module defines the error types shared by every crate that loads
//! settings or installs logging through this library.

use thiserror::Error;

/// Custom error type for configuration and start-up plumbing
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Environment variables could not be read or deserialized
    #[error("Configuration error: {0}")]
    Settings(#[from] config::ConfigError),

    /// A setting was present but had an unusable value
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// The global tracing subscriber could not be installed
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

/// Type alias for Result with ConfigurationError
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;
