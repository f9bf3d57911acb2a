use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaceGateError {
    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Local registration checks that must fail before the network is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name must not be empty")]
    NameRequired,

    #[error("File is not an image")]
    NotAnImage,

    #[error("Image too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

pub type Result<T> = std::result::Result<T, FaceGateError>;
