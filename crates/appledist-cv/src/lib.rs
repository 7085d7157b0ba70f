//! Apple detection and ranging on live video.
//!
//! Color-mask segmentation with OpenCV, per-detection distance from
//! [`appledist_core::DistanceEstimator`], annotation and the capture loop.

pub mod bbox;
pub mod capture;
pub mod detection;
pub mod error;
pub mod render;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use bbox::BBox;
pub use capture::CameraSource;
pub use detection::{Detection, DetectionConfig, Detections, FrameProcessor, HsvRange};
pub use error::{CaptureError, ConfigError, DetectionError};
pub use render::{Annotator, HighGuiWindow};
pub use session::{SessionSummary, StopReason};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Seams between the capture loop and its collaborators
pub mod traits {
    use super::*;
    use opencv::core::Mat;

    /// Blocking source of BGR frames
    pub trait FrameSource {
        /// `Ok(None)` once the stream has ended.
        fn read_frame(&mut self) -> std::result::Result<Option<Mat>, CaptureError>;
    }

    /// Display surface that also reports key presses
    pub trait FrameSink {
        fn show(&mut self, frame: &Mat) -> Result<()>;

        /// Key code pressed since the last poll, or a negative value for none.
        fn poll_key(&mut self) -> Result<i32>;
    }
}
