//! Startup calibration settings

use crate::error::EstimatorError;
use crate::estimator::DistanceEstimator;
use serde::{Deserialize, Serialize};

/// Reference measurement used to calibrate the model once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// True width of the reference object.
    pub reference_real_width_cm: f64,
    /// Width of the reference object in the image at the calibration distance.
    pub initial_reference_width_px: f64,
    /// Camera to reference object distance when the width above was taken.
    pub calibration_distance_cm: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            reference_real_width_cm: 7.5,
            initial_reference_width_px: 100.0,
            calibration_distance_cm: 45.0,
        }
    }
}

impl CalibrationConfig {
    /// Build the model and run the single-point calibration.
    pub fn calibrated_estimator(&self) -> Result<DistanceEstimator, EstimatorError> {
        let mut estimator =
            DistanceEstimator::new(self.reference_real_width_cm, self.initial_reference_width_px)?;
        estimator.calibrate(self.calibration_distance_cm)?;
        Ok(estimator)
    }
}
