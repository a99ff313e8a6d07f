//! Frame-by-frame tracking session.
//!
//! A session wraps one [`TrackedDetectionManager`] with the lifecycle the
//! application layer drives: `init` with the image size, `reset` when the
//! user starts tracking a new object, `process_frame` for every detector
//! output, and `destroy` when the camera goes away.

use std::sync::{Arc, Mutex};

use toytrack_core::{DetectionId, TrackedDetection, TrackedDetectionManager};
use toytrack_models::{FrameInput, NormalizedRect, Timestamp, TrackStatus, TrackingResult};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::logging::FrameLogger;

/// Image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Single-object tracking session.
#[derive(Debug)]
pub struct TrackingSession {
    config: SessionConfig,
    manager: TrackedDetectionManager,
    logger: FrameLogger,
    frame_size: Option<FrameSize>,
    initialized: bool,
    buffer_frames: u32,
    next_detection_id: DetectionId,
    frames_processed: u64,
    empty_frames: u32,
    last_timestamp: Option<Timestamp>,
    /// Last detection reported as the track since the previous reset
    last_track: Option<TrackedDetection>,
    status: TrackStatus,
}

impl TrackingSession {
    /// Create an uninitialized session.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            manager: TrackedDetectionManager::new(config.tracker),
            logger: FrameLogger::new(Uuid::new_v4().to_string()),
            frame_size: None,
            initialized: false,
            buffer_frames: config.buffer_frames,
            next_detection_id: 0,
            frames_processed: 0,
            empty_frames: 0,
            last_timestamp: None,
            last_track: None,
            status: TrackStatus::Searching,
        })
    }

    /// Record the image size and make the session ready for frames.
    pub fn init(&mut self, width: u32, height: u32) -> SessionResult<()> {
        if width == 0 || height == 0 {
            return Err(SessionError::InvalidFrameSize { width, height });
        }
        self.frame_size = Some(FrameSize { width, height });
        self.initialized = true;
        self.logger
            .log_lifecycle("init", &format!("frame size {}x{}", width, height));
        Ok(())
    }

    /// Forget every detection and start searching again.
    ///
    /// `buffer_frames` replaces the number of empty frames tolerated before
    /// the track is reported lost. The image size is kept.
    pub fn reset(&mut self, buffer_frames: u32) {
        self.clear_tracking_state();
        self.buffer_frames = buffer_frames;
        self.logger
            .log_lifecycle("reset", &format!("buffer_frames={}", buffer_frames));
    }

    /// Drop all state; the session must be initialized again before use.
    pub fn destroy(&mut self) {
        self.clear_tracking_state();
        self.buffer_frames = self.config.buffer_frames;
        self.frame_size = None;
        self.initialized = false;
        self.logger.log_lifecycle("destroy", "session released");
    }

    fn clear_tracking_state(&mut self) {
        self.manager.clear();
        self.next_detection_id = 0;
        self.frames_processed = 0;
        self.empty_frames = 0;
        self.last_timestamp = None;
        self.last_track = None;
        self.status = TrackStatus::Searching;
    }

    /// Run one frame of detector output through the identity manager.
    pub fn process_frame(&mut self, frame: &FrameInput) -> SessionResult<TrackingResult> {
        if !self.initialized {
            return Err(SessionError::NotInitialized);
        }
        let timestamp = frame.timestamp;
        if let Some(last) = self.last_timestamp {
            if timestamp < last {
                self.logger
                    .log_dropped_frame(timestamp, "timestamp older than last frame");
                return Err(SessionError::OutOfOrderTimestamp { timestamp, last });
            }
        }
        let span = self.logger.frame_span(timestamp);
        let _guard = span.enter();

        for candidate in &frame.detections {
            let id = self.allocate_detection_id();
            let mut detection = TrackedDetection::from_candidate(id, candidate, timestamp);
            if candidate.track_id.is_none() {
                detection = detection.with_track_id(Uuid::new_v4().to_string());
            }
            self.manager.add_detection(detection);
            self.manager.remove_duplicated_detections(id);
        }

        self.manager.remove_expired_detections(timestamp);
        if self.config.remove_out_of_view {
            self.manager.remove_out_of_view_detections();
        }

        self.frames_processed += 1;
        if self.frames_processed % u64::from(self.config.convergence_interval) == 0 {
            self.manager.remove_multiple_detections();
        }
        self.last_timestamp = Some(timestamp);

        let result = self.build_result(timestamp);
        if result.status != self.status {
            self.logger
                .log_status_change(self.status, result.status, timestamp);
            self.status = result.status;
        }
        self.logger
            .log_frame(&result, frame.detections.len(), self.manager.len());
        Ok(result)
    }

    fn build_result(&mut self, timestamp: Timestamp) -> TrackingResult {
        if let Some(best) = self.manager.best_detection().cloned() {
            self.empty_frames = 0;
            if !best.is_root() {
                self.manager.set_previous_confirmed_detection(Some(best.clone()));
            }
            let result = self.track_result(timestamp, TrackStatus::Tracking, &best);
            self.last_track = Some(best);
            return result;
        }

        let Some(last_track) = self.last_track.clone() else {
            return TrackingResult::without_box(timestamp, TrackStatus::Searching)
                .with_debug_message(self.debug_message());
        };

        self.empty_frames = self.empty_frames.saturating_add(1);
        if self.empty_frames < self.buffer_frames {
            self.track_result(timestamp, TrackStatus::Tracking, &last_track)
        } else {
            // A lost object may reappear anywhere.
            if self.manager.previous_confirmed_detection().is_some() {
                self.manager.set_previous_confirmed_detection(None);
                self.logger
                    .log_lifecycle("lost", "confirmed anchor cleared");
            }
            TrackingResult::without_box(timestamp, TrackStatus::Lost)
                .with_debug_message(self.debug_message())
        }
    }

    fn track_result(
        &self,
        timestamp: Timestamp,
        status: TrackStatus,
        detection: &TrackedDetection,
    ) -> TrackingResult {
        let mut result =
            TrackingResult::without_box(timestamp, status).with_debug_message(self.debug_message());
        let track_box = *detection.bounding_box();
        result.track_box = Some(track_box);
        result.track_box_pixels = self
            .frame_size
            .map(|size| track_box.to_pixels(size.width, size.height));
        result.detection_id = Some(detection.unique_id());
        result.labels = detection.labels();
        result
    }

    fn debug_message(&self) -> String {
        format!(
            "frame={} live={} empty_frames={}",
            self.frames_processed,
            self.manager.len(),
            self.empty_frames
        )
    }

    fn allocate_detection_id(&mut self) -> DetectionId {
        // Ids restart at 1 on overflow; detections that old are long expired.
        self.next_detection_id = self.next_detection_id.checked_add(1).unwrap_or(1);
        self.next_detection_id
    }

    /// Move a live detection, for an external box propagation stage.
    ///
    /// Returns the ids removed as duplicates of the moved detection.
    pub fn update_detection_location(
        &mut self,
        id: DetectionId,
        bounding_box: NormalizedRect,
        timestamp: Timestamp,
    ) -> Vec<DetectionId> {
        self.manager
            .update_detection_location(id, bounding_box, timestamp)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn frame_size(&self) -> Option<FrameSize> {
        self.frame_size
    }

    pub fn buffer_frames(&self) -> u32 {
        self.buffer_frames
    }

    pub fn status(&self) -> TrackStatus {
        self.status
    }

    pub fn session_id(&self) -> &str {
        self.logger.session_id()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn manager(&self) -> &TrackedDetectionManager {
        &self.manager
    }
}

/// A session shared between threads behind one lock.
#[derive(Debug, Clone)]
pub struct SharedTrackingSession {
    inner: Arc<Mutex<TrackingSession>>,
}

impl SharedTrackingSession {
    pub fn new(session: TrackingSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` with exclusive access to the session.
    pub fn with_session<T>(
        &self,
        f: impl FnOnce(&mut TrackingSession) -> SessionResult<T>,
    ) -> SessionResult<T> {
        let mut session = self.inner.lock().map_err(|_| SessionError::LockPoisoned)?;
        f(&mut session)
    }

    pub fn init(&self, width: u32, height: u32) -> SessionResult<()> {
        self.with_session(|session| session.init(width, height))
    }

    pub fn reset(&self, buffer_frames: u32) -> SessionResult<()> {
        self.with_session(|session| {
            session.reset(buffer_frames);
            Ok(())
        })
    }

    pub fn destroy(&self) -> SessionResult<()> {
        self.with_session(|session| {
            session.destroy();
            Ok(())
        })
    }

    pub fn process_frame(&self, frame: &FrameInput) -> SessionResult<TrackingResult> {
        self.with_session(|session| session.process_frame(frame))
    }
}
