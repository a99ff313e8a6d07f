//! Shared data models for ToyTrack.
//!
//! This crate provides Serde-serializable types for:
//! - Normalized and pixel bounding boxes
//! - Detector candidates and per-frame input
//! - Track status and per-frame tracking output

pub mod detection;
pub mod rect;
pub mod result;
pub mod status;

// Re-export common types
pub use detection::{DetectionCandidate, FrameInput, LabelScore, Timestamp};
pub use rect::{NormalizedRect, PixelRect, Point2};
pub use result::TrackingResult;
pub use status::{TrackStatus, TrackStatusParseError};
