//! Error types for tracker setup.
//!
//! The identity manager itself never fails; errors only arise when a
//! configuration is rejected before a manager is built.

use thiserror::Error;

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors that can occur while configuring the tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid configuration: {field} {message}")]
    InvalidConfig { field: &'static str, message: String },

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl TrackerError {
    /// Create an invalid configuration error.
    pub fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }
}
