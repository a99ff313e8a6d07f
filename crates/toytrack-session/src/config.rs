//! Session configuration.

use serde::{Deserialize, Serialize};
use toytrack_core::TrackerConfig;

use crate::error::{SessionError, SessionResult};

/// Configuration of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Identity manager thresholds
    pub tracker: TrackerConfig,
    /// Consecutive empty frames before a track is reported lost
    pub buffer_frames: u32,
    /// Run the convergence pass every N frames
    pub convergence_interval: u32,
    /// Evict detections that left the image
    pub remove_out_of_view: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            buffer_frames: 10,
            convergence_interval: 1,
            remove_out_of_view: true,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            tracker: TrackerConfig::from_env(),
            buffer_frames: std::env::var("TOYTRACK_BUFFER_FRAMES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            convergence_interval: std::env::var("TOYTRACK_CONVERGENCE_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            remove_out_of_view: std::env::var("TOYTRACK_REMOVE_OUT_OF_VIEW")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }

    pub fn validate(&self) -> SessionResult<()> {
        self.tracker.validate()?;
        if self.convergence_interval == 0 {
            return Err(SessionError::config_error(
                "convergence_interval must be at least 1",
            ));
        }
        Ok(())
    }
}
