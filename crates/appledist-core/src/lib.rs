//! Pinhole-camera distance model for a single reference object.
//!
//! The model is calibrated once from a known distance and then queried with
//! the pixel width of each detection.

pub mod calibration;
pub mod error;
pub mod estimator;

pub use calibration::CalibrationConfig;
pub use error::EstimatorError;
pub use estimator::{DistanceEstimator, Measurement};
