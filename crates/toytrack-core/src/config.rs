//! Tracker configuration.

use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};

/// Thresholds of the identity manager.
///
/// Supplied once when the manager is built and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Largest accepted ratio between the bigger and the smaller box area
    /// for two detections to be the same object (default: 3.0)
    pub max_area_ratio: f64,

    /// Smallest accepted intersection over the larger box area for two
    /// detections to be the same object (default: 0.5)
    pub min_overlap_ratio: f64,

    /// Detections not refreshed within this many microseconds are
    /// obsolete (default: 500_000)
    pub obsolete_horizon_us: i64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_area_ratio: 3.0,
            min_overlap_ratio: 0.5,
            obsolete_horizon_us: 500_000,
        }
    }
}

impl TrackerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_area_ratio: std::env::var("TOYTRACK_MAX_AREA_RATIO")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_area_ratio),
            min_overlap_ratio: std::env::var("TOYTRACK_MIN_OVERLAP_RATIO")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.min_overlap_ratio),
            obsolete_horizon_us: std::env::var("TOYTRACK_OBSOLETE_HORIZON_US")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.obsolete_horizon_us),
        }
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> TrackerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds the similarity test cannot work with.
    pub fn validate(&self) -> TrackerResult<()> {
        if !self.max_area_ratio.is_finite() || self.max_area_ratio < 1.0 {
            return Err(TrackerError::invalid_config(
                "max_area_ratio",
                format!("must be a finite value >= 1.0, got {}", self.max_area_ratio),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_overlap_ratio) {
            return Err(TrackerError::invalid_config(
                "min_overlap_ratio",
                format!("must be within [0, 1], got {}", self.min_overlap_ratio),
            ));
        }
        if self.obsolete_horizon_us < 0 {
            return Err(TrackerError::invalid_config(
                "obsolete_horizon_us",
                format!("must not be negative, got {}", self.obsolete_horizon_us),
            ));
        }
        Ok(())
    }
}
