use std::fs;

use image::{DynamicImage, ImageBuffer, Luma};
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::camera::{EncodedFrame, FrameSource};
use crate::common::{CameraConfig, FaceGateError, Result};

/// V4L2-backed frame source. Opens the device up front; grabs a short-lived
/// stream per capture so the device is released between attempts.
pub struct Camera {
    device: Device,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Result<Self> {
        let device_index = if config.device_index == 999 {
            // Special value 999 means auto-detect
            Self::detect_camera()?
        } else {
            config.device_index
        };
        Self::new_with_device(device_index, config)
    }

    /// Pick the first /dev/video* device that reports video capture.
    pub fn detect_camera() -> Result<u32> {
        let mut indices = Vec::new();
        for entry in fs::read_dir("/dev")? {
            let entry = entry?;
            let filename = entry.file_name();
            let filename = filename.to_str().unwrap_or("");
            if let Some(index_str) = filename.strip_prefix("video") {
                if let Ok(index) = index_str.parse::<u32>() {
                    indices.push(index);
                }
            }
        }
        indices.sort_unstable();

        for index in indices {
            if let Ok(device) = Device::new(index as usize) {
                if let Ok(caps) = device.query_caps() {
                    if caps
                        .capabilities
                        .contains(v4l::capability::Flags::VIDEO_CAPTURE)
                    {
                        info!(index, card = %caps.card, "auto-detected camera");
                        return Ok(index);
                    }
                }
            }
        }

        Err(FaceGateError::Camera(
            "No video capture device found".into(),
        ))
    }

    pub fn new_with_device(index: u32, config: &CameraConfig) -> Result<Self> {
        let device = Device::new(index as usize)
            .map_err(|e| FaceGateError::Camera(format!("Failed to open camera {}: {}", index, e)))?;

        let caps = device
            .query_caps()
            .map_err(|e| FaceGateError::Camera(format!("Failed to query capabilities: {}", e)))?;

        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            warn!(index, "device may not support standard video capture");
        }

        let mut fmt = device
            .format()
            .map_err(|e| FaceGateError::Camera(format!("Failed to get format: {}", e)))?;

        fmt.width = config.width;
        fmt.height = config.height;

        // Keep GREY for IR devices, otherwise ask for MJPG so frames arrive
        // JPEG-encoded already.
        if fmt.fourcc.str() != Ok("GREY") {
            fmt.fourcc = FourCC::new(b"MJPG");
        }

        match device.set_format(&fmt) {
            Ok(actual) => {
                if actual.width != config.width || actual.height != config.height {
                    warn!(
                        "camera resolution {}x{} differs from requested {}x{}",
                        actual.width, actual.height, config.width, config.height
                    );
                }
            }
            Err(e) => warn!("could not set camera format, using device defaults: {}", e),
        }

        info!(index, card = %caps.card, "camera opened");
        Ok(Self { device })
    }

    fn grab(&mut self) -> Result<Option<EncodedFrame>> {
        let fmt = self
            .device
            .format()
            .map_err(|e| FaceGateError::Camera(format!("Failed to get format: {}", e)))?;

        let mut stream =
            v4l::io::mmap::Stream::with_buffers(&mut self.device, Type::VideoCapture, 4)
                .map_err(|e| FaceGateError::Camera(format!("Failed to create stream: {}", e)))?;

        // The first buffer off a fresh stream is often stale; discard it.
        if stream.next().is_err() {
            return Ok(None);
        }

        let (buf, _meta) = match stream.next() {
            Ok(frame) => frame,
            Err(e) => {
                debug!("frame capture failed: {}", e);
                return Ok(None);
            }
        };

        if buf.is_empty() {
            return Ok(None);
        }

        match fmt.fourcc.str() {
            Ok("MJPG") => Ok(Some(EncodedFrame::from_jpeg_bytes(buf))),
            Ok("GREY") => {
                let image = grey_to_image(buf, fmt.width, fmt.height)?;
                Ok(Some(EncodedFrame::from_image(&image)?))
            }
            other => Err(FaceGateError::Camera(format!(
                "Unsupported camera format: {:?}",
                other
            ))),
        }
    }
}

impl FrameSource for Camera {
    fn next_frame(&mut self) -> Result<Option<EncodedFrame>> {
        self.grab()
    }
}

fn grey_to_image(data: &[u8], width: u32, height: u32) -> Result<DynamicImage> {
    let buffer = ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data.to_vec())
        .ok_or_else(|| FaceGateError::Camera("Failed to create grayscale image buffer".into()))?;
    Ok(DynamicImage::ImageLuma8(buffer))
}
