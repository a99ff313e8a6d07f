//! Metrics emitted by the identity manager.
//!
//! Uses the `metrics` facade; nothing is recorded until the host installs a
//! recorder.

use metrics::{counter, gauge};

/// Metric names as constants for consistency.
pub mod names {
    pub const DETECTIONS_ADMITTED_TOTAL: &str = "toytrack_detections_admitted_total";
    pub const DETECTIONS_REMOVED_TOTAL: &str = "toytrack_detections_removed_total";
    pub const DETECTIONS_LIVE: &str = "toytrack_detections_live";
}

/// Why a detection left the live set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Duplicate,
    Convergence,
    Obsolete,
    OutOfView,
}

impl RemovalReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovalReason::Duplicate => "duplicate",
            RemovalReason::Convergence => "convergence",
            RemovalReason::Obsolete => "obsolete",
            RemovalReason::OutOfView => "out_of_view",
        }
    }
}

/// Record an admitted detection.
pub fn record_admitted() {
    counter!(names::DETECTIONS_ADMITTED_TOTAL).increment(1);
}

/// Record detections removed for `reason`.
pub fn record_removed(reason: RemovalReason, count: usize) {
    if count == 0 {
        return;
    }
    let labels = [("reason", reason.as_str().to_string())];
    counter!(names::DETECTIONS_REMOVED_TOTAL, &labels).increment(count as u64);
}

/// Update the live detection gauge.
pub fn set_live_detections(count: usize) {
    gauge!(names::DETECTIONS_LIVE).set(count as f64);
}
