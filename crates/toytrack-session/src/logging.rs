//! Structured session logging.
//!
//! Every line carries the session id so interleaved sessions can be told
//! apart in aggregated logs.

use tracing::{debug, info, warn, Span};
use toytrack_models::{TrackStatus, TrackingResult};

/// Session-scoped logger with consistent fields.
#[derive(Debug, Clone)]
pub struct FrameLogger {
    session_id: String,
}

impl FrameLogger {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    /// Log a lifecycle event such as init, reset or destroy.
    pub fn log_lifecycle(&self, event: &str, message: &str) {
        info!(
            session_id = %self.session_id,
            event = event,
            "Session {}: {}", event, message
        );
    }

    /// Log the outcome of one frame.
    pub fn log_frame(&self, result: &TrackingResult, candidates: usize, live: usize) {
        debug!(
            session_id = %self.session_id,
            timestamp = result.timestamp,
            status = %result.status,
            detection_id = ?result.detection_id,
            candidates = candidates,
            live = live,
            "Frame processed"
        );
    }

    /// Log a track status transition.
    pub fn log_status_change(&self, from: TrackStatus, to: TrackStatus, timestamp: i64) {
        info!(
            session_id = %self.session_id,
            from = %from,
            to = %to,
            timestamp = timestamp,
            "Track status changed"
        );
    }

    /// Log a frame that was dropped.
    pub fn log_dropped_frame(&self, timestamp: i64, reason: &str) {
        warn!(
            session_id = %self.session_id,
            timestamp = timestamp,
            "Frame dropped: {}", reason
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Create a tracing span for one frame.
    pub fn frame_span(&self, timestamp: i64) -> Span {
        tracing::debug_span!(
            "frame",
            session_id = %self.session_id,
            timestamp = timestamp
        )
    }
}
