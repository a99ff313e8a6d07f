//! Track status reported to the application.
//!
//! - `Searching`: no track has been established since the last reset
//! - `Tracking`: a track is live, or was seen within the buffered frames
//! - `Lost`: the track has been missing for longer than the buffer allows

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Status of the single tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    /// Nothing tracked yet.
    #[default]
    Searching,

    /// Object is being tracked.
    Tracking,

    /// Object was tracked and has disappeared.
    Lost,
}

impl TrackStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackStatus::Searching => "searching",
            TrackStatus::Tracking => "tracking",
            TrackStatus::Lost => "lost",
        }
    }
}

impl fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TrackStatus {
    type Err = TrackStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "searching" => Ok(TrackStatus::Searching),
            "tracking" => Ok(TrackStatus::Tracking),
            "lost" => Ok(TrackStatus::Lost),
            _ => Err(TrackStatusParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown track status: {0}")]
pub struct TrackStatusParseError(String);
