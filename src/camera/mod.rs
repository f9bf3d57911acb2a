pub mod v4l2;

pub use v4l2::Camera;

use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::DynamicImage;

use crate::common::Result;

const JPEG_QUALITY: u8 = 85;

/// A still frame, JPEG-encoded and wrapped as a base64 data URL, which is
/// the shape the recognition service expects on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    data_url: String,
}

impl EncodedFrame {
    pub fn from_jpeg_bytes(bytes: &[u8]) -> Self {
        Self {
            data_url: format!("data:image/jpeg;base64,{}", BASE64.encode(bytes)),
        }
    }

    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, image::ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
        Ok(Self::from_jpeg_bytes(buf.get_ref()))
    }

    pub(crate) fn from_data_url(data_url: String) -> Self {
        Self { data_url }
    }

    pub fn as_data_url(&self) -> &str {
        &self.data_url
    }
}

/// Produces encoded stills on demand. `Ok(None)` means no frame is available
/// right now (device not ready, empty buffer); callers treat that as a skip,
/// not a failure. No timing logic lives here.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<EncodedFrame>>;
}

/// Serves a single image file on every request. Stands in for the camera in
/// development and when testing against a known picture.
pub struct StillSource {
    frame: EncodedFrame,
}

impl StillSource {
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)?;
        Ok(Self {
            frame: EncodedFrame::from_image(&image)?,
        })
    }
}

impl FrameSource for StillSource {
    fn next_frame(&mut self) -> Result<Option<EncodedFrame>> {
        Ok(Some(self.frame.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_frame_is_a_jpeg_data_url() {
        let frame = EncodedFrame::from_jpeg_bytes(&[0xff, 0xd8, 0xff]);
        assert!(frame.as_data_url().starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn from_image_round_trips_through_base64() {
        let image = DynamicImage::new_rgb8(4, 4);
        let frame = EncodedFrame::from_image(&image).unwrap();
        let payload = frame
            .as_data_url()
            .strip_prefix("data:image/jpeg;base64,")
            .unwrap();
        let bytes = BASE64.decode(payload).unwrap();
        // JPEG SOI marker
        assert_eq!(&bytes[..2], &[0xff, 0xd8][..]);
    }
}
