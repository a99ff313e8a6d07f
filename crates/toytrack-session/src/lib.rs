//! Tracking session for ToyTrack.
//!
//! Drives a `TrackedDetectionManager` frame by frame and turns its live set
//! into one reported track with a searching / tracking / lost status.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use logging::FrameLogger;
pub use session::{FrameSize, SharedTrackingSession, TrackingSession};
