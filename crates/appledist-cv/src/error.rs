//! Error types for capture, detection and configuration

use appledist_core::EstimatorError;
use thiserror::Error;

/// Video source failures.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Cannot open video capture device {device_index}")]
    DeviceUnavailable { device_index: i32 },

    #[error("failed to read frame from video source")]
    ReadFailed(#[source] opencv::Error),
}

/// Failure of a single lazily produced detection.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("contour processing failed")]
    OpenCv(#[from] opencv::Error),

    #[error(transparent)]
    Estimator(#[from] EstimatorError),
}

impl DetectionError {
    /// Whether the loop may skip this detection and carry on.
    pub fn is_recoverable(&self) -> bool {
        match self {
            DetectionError::Estimator(err) => err.is_recoverable(),
            DetectionError::OpenCv(_) => false,
        }
    }
}

/// Rejected detection settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("color mask channel {channel}: lower bound {lower} exceeds upper bound {upper}")]
    InvertedColorBounds { channel: usize, lower: u8, upper: u8 },

    #[error("minimum contour area must be a non-negative number, got {area}")]
    InvalidMinArea { area: f64 },

    #[error("morphology kernel size must be odd, positive and at most {max}, got {size}")]
    InvalidKernelSize { size: u32, max: u32 },

    #[error("morphology iterations must be at most {max}, got {iterations}")]
    TooManyIterations { iterations: u32, max: u32 },
}
