pub mod config;
pub mod error;
pub mod paths;

pub use config::{CameraConfig, Config, RegistrationConfig, ScanConfig, ServiceConfig};
pub use error::{FaceGateError, Result, ValidationError};
