use std::sync::Arc;

use tracing::debug;

use crate::camera::FrameSource;
use crate::core::outcome::AttemptOutcome;
use crate::service::RecognitionApi;

/// Performs exactly one authentication attempt: pull a frame, hand it to the
/// recognition service, return the classified outcome. Session transitions
/// are the scheduler's job; nothing is mutated here.
pub struct AttemptExecutor {
    frames: Box<dyn FrameSource>,
    api: Arc<dyn RecognitionApi>,
}

impl AttemptExecutor {
    pub fn new(frames: Box<dyn FrameSource>, api: Arc<dyn RecognitionApi>) -> Self {
        Self { frames, api }
    }

    /// `None` means the attempt was skipped without touching the network:
    /// the camera had no frame for us. That is normal while the user is
    /// still positioning and must not disturb the status text.
    pub fn run_once(&mut self) -> Option<AttemptOutcome> {
        let frame = match self.frames.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("no frame available, skipping attempt");
                return None;
            }
            Err(e) => {
                debug!("frame capture failed, skipping attempt: {}", e);
                return None;
            }
        };

        Some(self.api.login(&frame))
    }
}
