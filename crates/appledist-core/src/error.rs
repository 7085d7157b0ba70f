use thiserror::Error;

/// Failures of the distance model.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum EstimatorError {
    #[error("focal length has not been calibrated")]
    Uncalibrated,

    #[error("invalid measurement: observed width must be positive, got {width_px} px")]
    InvalidMeasurement { width_px: f64 },

    #[error("invalid calibration input: distance must be positive, got {distance_cm} cm")]
    InvalidCalibrationInput { distance_cm: f64 },

    #[error("invalid focal length: must be positive, got {focal_length}")]
    InvalidFocalLength { focal_length: f64 },

    #[error("invalid reference width: real width must be positive, got {width_cm} cm")]
    InvalidReferenceWidth { width_cm: f64 },
}

impl EstimatorError {
    /// Bad input from a single frame can be skipped. Querying an uncalibrated
    /// model is a logic fault and must reach the caller.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EstimatorError::Uncalibrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncalibrated_is_fatal() {
        assert!(!EstimatorError::Uncalibrated.is_recoverable());
        assert!(EstimatorError::InvalidMeasurement { width_px: 0.0 }.is_recoverable());
        assert!(EstimatorError::InvalidCalibrationInput { distance_cm: -1.0 }.is_recoverable());
    }

    #[test]
    fn test_messages_carry_values() {
        let err = EstimatorError::InvalidMeasurement { width_px: -3.0 };
        assert!(err.to_string().contains("-3"));
    }
}
