//! Camera capture

use crate::error::CaptureError;
use crate::traits::FrameSource;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};

/// Video device opened through OpenCV. Released on drop.
pub struct CameraSource {
    capture: VideoCapture,
    device_index: i32,
}

impl CameraSource {
    pub fn open(device_index: i32) -> Result<Self, CaptureError> {
        let unavailable = CaptureError::DeviceUnavailable { device_index };

        let capture = match VideoCapture::new(device_index, videoio::CAP_ANY) {
            Ok(capture) => capture,
            Err(err) => {
                log::debug!("VideoCapture::new({}) failed: {}", device_index, err);
                return Err(unavailable);
            }
        };
        if !capture.is_opened().unwrap_or(false) {
            return Err(unavailable);
        }

        log::info!("Opened video capture device {}", device_index);
        Ok(Self {
            capture,
            device_index,
        })
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self) -> Result<Option<Mat>, CaptureError> {
        let mut frame = Mat::default();
        match self.capture.read(&mut frame) {
            Ok(true) if !frame.empty() => Ok(Some(frame)),
            Ok(_) => Ok(None),
            Err(err) => Err(CaptureError::ReadFailed(err)),
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        match self.capture.release() {
            Ok(()) => log::info!("Released video capture device {}", self.device_index),
            Err(err) => log::warn!(
                "Failed to release video capture device {}: {}",
                self.device_index,
                err
            ),
        }
    }
}
