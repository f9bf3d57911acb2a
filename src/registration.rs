use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::ImageFormat;
use tracing::info;

use crate::camera::EncodedFrame;
use crate::common::{RegistrationConfig, Result, ValidationError};
use crate::service::RecognitionApi;

/// One deliberate, user-initiated enrollment: a name plus an image file.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub name: String,
    pub image_path: PathBuf,
}

/// Validates a registration locally and performs the single POST. Invalid
/// requests never reach the network; there is no retry and no concurrency
/// to guard against.
pub struct RegistrationSubmitter {
    api: Arc<dyn RecognitionApi>,
    max_image_bytes: u64,
}

impl RegistrationSubmitter {
    pub fn new(api: Arc<dyn RecognitionApi>, config: &RegistrationConfig) -> Self {
        Self {
            api,
            max_image_bytes: config.max_image_bytes,
        }
    }

    /// Returns the server's confirmation message on success.
    pub fn submit(&self, request: &RegistrationRequest) -> Result<String> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ValidationError::NameRequired.into());
        }

        let size = fs::metadata(&request.image_path)?.len();
        if size > self.max_image_bytes {
            return Err(ValidationError::TooLarge {
                size,
                limit: self.max_image_bytes,
            }
            .into());
        }

        let bytes = fs::read(&request.image_path)?;
        let format = image::guess_format(&bytes).map_err(|_| ValidationError::NotAnImage)?;

        let frame = encode_payload(format, &bytes);
        info!(name, size, "submitting registration");
        self.api.register(name, &frame)
    }
}

fn encode_payload(format: ImageFormat, bytes: &[u8]) -> EncodedFrame {
    match format {
        ImageFormat::Jpeg => EncodedFrame::from_jpeg_bytes(bytes),
        other => {
            let mime = mime_for(other);
            EncodedFrame::from_data_url(format!("data:{};base64,{}", mime, BASE64.encode(bytes)))
        }
    }
}

fn mime_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        _ => "application/octet-stream",
    }
}
