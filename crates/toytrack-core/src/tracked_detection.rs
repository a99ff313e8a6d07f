//! A single candidate of the tracked object.
//!
//! Identity (`unique_id`, `initial_timestamp`) is fixed at construction.
//! Geometry, update time and the identity-chain pointer change as the
//! manager reconciles new evidence.

use std::collections::BTreeMap;

use toytrack_models::{DetectionCandidate, LabelScore, NormalizedRect, Point2, Timestamp};

/// Identifier assigned to a detection by its producer.
pub type DetectionId = i32;

/// One candidate detection of the tracked object.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedDetection {
    unique_id: DetectionId,
    /// `None` marks the root of an identity chain
    previous_id: Option<DetectionId>,
    initial_timestamp: Timestamp,
    last_updated_timestamp: Timestamp,
    bounding_box: NormalizedRect,
    label_scores: BTreeMap<String, f64>,
    track_id: String,
}

impl TrackedDetection {
    /// Create a root detection first seen at `timestamp`.
    pub fn new(unique_id: DetectionId, bounding_box: NormalizedRect, timestamp: Timestamp) -> Self {
        Self {
            unique_id,
            previous_id: None,
            initial_timestamp: timestamp,
            last_updated_timestamp: timestamp,
            bounding_box,
            label_scores: BTreeMap::new(),
            track_id: String::new(),
        }
    }

    /// Build a detection from a detector candidate.
    pub fn from_candidate(
        unique_id: DetectionId,
        candidate: &DetectionCandidate,
        timestamp: Timestamp,
    ) -> Self {
        let mut detection = Self::new(unique_id, candidate.bounding_box, timestamp);
        for label_score in &candidate.labels {
            detection.add_label_score(&label_score.label, label_score.score);
        }
        if let Some(track_id) = &candidate.track_id {
            detection.track_id = track_id.clone();
        }
        detection
    }

    /// Add a label, keeping the higher score if it is already present.
    pub fn with_label(mut self, label: impl Into<String>, score: f64) -> Self {
        self.add_label_score(&label.into(), score);
        self
    }

    /// Attach a debug track identifier.
    pub fn with_track_id(mut self, track_id: impl Into<String>) -> Self {
        self.track_id = track_id.into();
        self
    }

    pub fn unique_id(&self) -> DetectionId {
        self.unique_id
    }

    pub fn previous_id(&self) -> Option<DetectionId> {
        self.previous_id
    }

    /// True when no predecessor is known.
    pub fn is_root(&self) -> bool {
        self.previous_id.is_none()
    }

    pub fn initial_timestamp(&self) -> Timestamp {
        self.initial_timestamp
    }

    pub fn last_updated_timestamp(&self) -> Timestamp {
        self.last_updated_timestamp
    }

    pub fn bounding_box(&self) -> &NormalizedRect {
        &self.bounding_box
    }

    pub fn label_scores(&self) -> &BTreeMap<String, f64> {
        &self.label_scores
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn set_bounding_box(&mut self, bounding_box: NormalizedRect) {
        self.bounding_box = bounding_box;
    }

    pub fn set_last_updated_timestamp(&mut self, timestamp: Timestamp) {
        self.last_updated_timestamp = timestamp;
    }

    pub fn set_previous_id(&mut self, previous_id: Option<DetectionId>) {
        self.previous_id = previous_id;
    }

    /// Labels as a list ordered by label name.
    pub fn labels(&self) -> Vec<LabelScore> {
        self.label_scores
            .iter()
            .map(|(label, score)| LabelScore::new(label.clone(), *score))
            .collect()
    }

    /// Whether `self` and `other` are judged to be the same physical object.
    ///
    /// Both conditions must hold: the larger area is at most
    /// `max_area_ratio` times the smaller one, and the intersection covers
    /// at least `min_overlap_ratio` of the larger box. Boxes without area
    /// never match.
    pub fn is_same_as(
        &self,
        other: &TrackedDetection,
        max_area_ratio: f64,
        min_overlap_ratio: f64,
    ) -> bool {
        let area = self.bounding_box.area();
        let other_area = other.bounding_box.area();
        if area <= 0.0 || other_area <= 0.0 {
            return false;
        }

        let (larger, smaller) = if area >= other_area {
            (area, other_area)
        } else {
            (other_area, area)
        };
        if larger / smaller > max_area_ratio {
            return false;
        }

        let intersection = self.bounding_box.intersection_area(&other.bounding_box);
        intersection / larger >= min_overlap_ratio
    }

    /// Intersection over union of the two boxes.
    pub fn intersection_over_union(&self, other: &TrackedDetection) -> f64 {
        self.bounding_box.iou(&other.bounding_box)
    }

    /// Corners of the bounding box in normalized coordinates.
    pub fn corners(&self) -> [Point2; 4] {
        self.bounding_box.corners()
    }

    /// Union `other`'s labels into this detection. Geometry is untouched.
    pub fn merge_label_scores(&mut self, other: &TrackedDetection) {
        for (label, score) in &other.label_scores {
            self.add_label_score(label, *score);
        }
    }

    fn add_label_score(&mut self, label: &str, score: f64) {
        match self.label_scores.get_mut(label) {
            Some(existing) if *existing >= score => {}
            Some(existing) => *existing = score,
            None => {
                self.label_scores.insert(label.to_string(), score);
            }
        }
    }
}
