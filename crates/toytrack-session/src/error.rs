//! Session error types.

use thiserror::Error;
use toytrack_core::TrackerError;
use toytrack_models::Timestamp;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session is not initialized")]
    NotInitialized,

    #[error("Invalid frame size: {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },

    #[error("Frame at {timestamp} is older than the last processed frame at {last}")]
    OutOfOrderTimestamp { timestamp: Timestamp, last: Timestamp },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Session lock poisoned")]
    LockPoisoned,

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

impl SessionError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the caller can skip the offending frame and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SessionError::OutOfOrderTimestamp { .. })
    }
}
