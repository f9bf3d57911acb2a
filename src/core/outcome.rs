use crate::core::session::AuthenticatedUser;

/// Classified result of one recognition attempt. Every non-success kind is
/// retryable; only `Success` (or an explicit stop) ends the scan loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The service matched a registered face.
    Success(AuthenticatedUser),
    /// The service saw a face but it matched nobody (HTTP 401).
    NotRecognized,
    /// The service found no usable face in the frame (HTTP 400).
    FrameInvalid,
    /// Anything else: transport failure, server error, malformed body.
    TransientFailure(String),
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success(_))
    }

    /// Advisory status line shown while scanning continues. `None` for
    /// success, which clears the status instead.
    pub fn status_line(&self) -> Option<&'static str> {
        match self {
            AttemptOutcome::Success(_) => None,
            AttemptOutcome::NotRecognized => Some("Face not recognized, retrying..."),
            AttemptOutcome::FrameInvalid => Some("No clear view of your face, hold still..."),
            AttemptOutcome::TransientFailure(_) => Some("Connection problem, retrying..."),
        }
    }
}
