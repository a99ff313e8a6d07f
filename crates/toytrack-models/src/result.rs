//! Per-frame tracking output consumed by the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::detection::{LabelScore, Timestamp};
use crate::rect::{NormalizedRect, PixelRect};
use crate::status::TrackStatus;

/// Tracking output for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrackingResult {
    /// Frame time in microseconds
    pub timestamp: Timestamp,
    pub status: TrackStatus,
    /// Best-guess box of the tracked object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_box: Option<NormalizedRect>,
    /// Same box in pixels, when the frame size is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_box_pixels: Option<PixelRect>,
    /// Id of the detection the box was read from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<LabelScore>,
    #[serde(default)]
    pub debug_message: String,
}

impl TrackingResult {
    /// A result without a box.
    pub fn without_box(timestamp: Timestamp, status: TrackStatus) -> Self {
        Self {
            timestamp,
            status,
            track_box: None,
            track_box_pixels: None,
            detection_id: None,
            labels: Vec::new(),
            debug_message: String::new(),
        }
    }

    /// Attach a debug message.
    pub fn with_debug_message(mut self, message: impl Into<String>) -> Self {
        self.debug_message = message.into();
        self
    }

    /// Serialize as a single JSON line.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
