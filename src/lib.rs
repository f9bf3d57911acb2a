// Core modules
pub mod camera;
pub mod common;
pub mod core;
pub mod registration;
pub mod service;

// Re-export commonly used types
pub use camera::{Camera, EncodedFrame, FrameSource, StillSource};
pub use common::{Config, FaceGateError, Result, ValidationError};
pub use core::{
    AttemptExecutor, AttemptOutcome, AuthenticatedUser, Phase, ScanScheduler, Session,
    SharedSession,
};
pub use registration::{RegistrationRequest, RegistrationSubmitter};
pub use service::{protocol, HttpRecognitionClient, RecognitionApi};
