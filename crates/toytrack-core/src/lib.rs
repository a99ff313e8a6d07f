//! Tracked-detection identity manager.
//!
//! This crate provides:
//! - `TrackedDetection`: one candidate of the tracked object with its
//!   identity chain pointer and merged labels
//! - `TrackedDetectionManager`: admission, duplicate resolution, eviction
//!   and multi-candidate convergence over the live set
//! - `TrackerConfig`: similarity thresholds and the obsolescence horizon
//! - Metrics helpers emitted through the `metrics` facade

pub mod config;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod tracked_detection;

pub use config::TrackerConfig;
pub use error::{TrackerError, TrackerResult};
pub use manager::TrackedDetectionManager;
pub use metrics::RemovalReason;
pub use tracked_detection::{DetectionId, TrackedDetection};
