//! Detector output as handed to the tracker.
//!
//! The upstream detector decodes model output into these candidates. The
//! tracker assigns identities and timestamps on admission.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rect::NormalizedRect;

/// Microsecond timestamp of a frame.
pub type Timestamp = i64;

/// A class label with its detector confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// One candidate bounding box produced by the detector for a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectionCandidate {
    /// Normalized bounding box
    pub bounding_box: NormalizedRect,
    /// Labels and confidences, possibly empty
    #[serde(default)]
    pub labels: Vec<LabelScore>,
    /// Optional debug identifier carried through to the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl DetectionCandidate {
    /// Create a candidate without labels.
    pub fn new(bounding_box: NormalizedRect) -> Self {
        Self {
            bounding_box,
            labels: Vec::new(),
            track_id: None,
        }
    }

    /// Add a label with its score.
    pub fn with_label(mut self, label: impl Into<String>, score: f64) -> Self {
        self.labels.push(LabelScore::new(label, score));
        self
    }
}

/// All candidates the detector produced for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameInput {
    /// Frame time in microseconds
    pub timestamp: Timestamp,
    #[serde(default)]
    pub detections: Vec<DetectionCandidate>,
}

impl FrameInput {
    pub fn new(timestamp: Timestamp, detections: Vec<DetectionCandidate>) -> Self {
        Self {
            timestamp,
            detections,
        }
    }

    /// A frame in which the detector found nothing.
    pub fn empty(timestamp: Timestamp) -> Self {
        Self::new(timestamp, Vec::new())
    }
}
