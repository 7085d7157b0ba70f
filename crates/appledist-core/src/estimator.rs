//! Focal-length calibration and inverse-projection distance estimate.
//!
//! Under the pinhole approximation the apparent width of an object is
//! inversely proportional to its distance, so a single reference measurement
//! fixes the focal length in pixel units:
//!
//! ```text
//! focal_length = observed_width_px * distance_cm / real_width_cm
//! distance_cm  = real_width_cm * focal_length / observed_width_px
//! ```

use crate::error::EstimatorError;

/// Calibration state for one object class.
///
/// Only built through [`new`](Self::new), so the real width is always
/// positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimator {
    real_width_cm: f64,
    observed_width_px: f64,
    focal_length: Option<f64>,
}

/// Result of measuring one detection against the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub distance_cm: f64,
    /// Copy of the model with `observed_width_px` set to the measured width.
    pub estimator: DistanceEstimator,
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl DistanceEstimator {
    /// Create an uncalibrated model.
    ///
    /// `observed_width_px` is the width of the reference object as seen at the
    /// calibration distance. It is only checked when it is used.
    pub fn new(real_width_cm: f64, observed_width_px: f64) -> Result<Self, EstimatorError> {
        if !is_positive(real_width_cm) {
            return Err(EstimatorError::InvalidReferenceWidth {
                width_cm: real_width_cm,
            });
        }

        Ok(Self {
            real_width_cm,
            observed_width_px,
            focal_length: None,
        })
    }

    /// Use a focal length obtained elsewhere instead of calibrating.
    pub fn with_focal_length(mut self, focal_length: f64) -> Result<Self, EstimatorError> {
        if !is_positive(focal_length) {
            return Err(EstimatorError::InvalidFocalLength { focal_length });
        }
        self.focal_length = Some(focal_length);
        Ok(self)
    }

    pub fn observed_width_px(&self) -> f64 {
        self.observed_width_px
    }

    pub fn focal_length(&self) -> Option<f64> {
        self.focal_length
    }

    pub fn is_calibrated(&self) -> bool {
        self.focal_length.is_some()
    }

    /// Record the latest pixel width. Validation is deferred to the query.
    pub fn set_observed_width_px(&mut self, observed_width_px: f64) {
        self.observed_width_px = observed_width_px;
    }

    /// Solve for the focal length, assuming the current observed width was
    /// measured with the reference object at `measured_distance_cm`.
    ///
    /// Returns the new focal length. On error the model is left unchanged.
    pub fn calibrate(&mut self, measured_distance_cm: f64) -> Result<f64, EstimatorError> {
        if !is_positive(measured_distance_cm) {
            return Err(EstimatorError::InvalidCalibrationInput {
                distance_cm: measured_distance_cm,
            });
        }
        if !is_positive(self.observed_width_px) {
            return Err(EstimatorError::InvalidMeasurement {
                width_px: self.observed_width_px,
            });
        }

        let focal_length = (self.observed_width_px * measured_distance_cm) / self.real_width_cm;
        if !is_positive(focal_length) {
            return Err(EstimatorError::InvalidFocalLength { focal_length });
        }
        self.focal_length = Some(focal_length);
        Ok(focal_length)
    }

    /// Distance in centimeters for the current observed width.
    pub fn estimate_distance(&self) -> Result<f64, EstimatorError> {
        self.distance_for(self.observed_width_px)
    }

    /// Distance for `observed_width_px` without touching this model.
    ///
    /// The returned [`Measurement`] carries an updated copy for callers that
    /// want to keep the last measurement around.
    pub fn measure(&self, observed_width_px: f64) -> Result<Measurement, EstimatorError> {
        let distance_cm = self.distance_for(observed_width_px)?;
        let mut estimator = *self;
        estimator.observed_width_px = observed_width_px;

        Ok(Measurement {
            distance_cm,
            estimator,
        })
    }

    fn distance_for(&self, observed_width_px: f64) -> Result<f64, EstimatorError> {
        let focal_length = self.focal_length.ok_or(EstimatorError::Uncalibrated)?;
        if !is_positive(self.real_width_cm) {
            return Err(EstimatorError::InvalidReferenceWidth {
                width_cm: self.real_width_cm,
            });
        }
        if !is_positive(observed_width_px) {
            return Err(EstimatorError::InvalidMeasurement {
                width_px: observed_width_px,
            });
        }

        // Extreme inputs can still overflow or underflow the quotient.
        let distance_cm = (self.real_width_cm * focal_length) / observed_width_px;
        if !is_positive(distance_cm) {
            return Err(EstimatorError::InvalidMeasurement {
                width_px: observed_width_px,
            });
        }
        Ok(distance_cm)
    }
}
