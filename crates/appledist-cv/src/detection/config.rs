//! Detection configuration

use crate::error::ConfigError;
use opencv::core::Scalar;
use serde::{Deserialize, Serialize};

/// Inclusive HSV bounds in OpenCV units (hue 0..=179, saturation and value 0..=255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn lower_scalar(&self) -> Scalar {
        to_scalar(self.lower)
    }

    pub fn upper_scalar(&self) -> Scalar {
        to_scalar(self.upper)
    }
}

fn to_scalar(channels: [u8; 3]) -> Scalar {
    Scalar::new(
        channels[0] as f64,
        channels[1] as f64,
        channels[2] as f64,
        0.0,
    )
}

/// Upper bound on `morph_iterations`.
pub const MAX_MORPH_ITERATIONS: u32 = 64;
/// Upper bound on `kernel_size`.
pub const MAX_KERNEL_SIZE: u32 = 255;

/// Main detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Label drawn next to each detection.
    pub class_label: String,
    pub color_mask: HsvRange,
    /// Contours must be strictly larger than this, in square pixels.
    /// Depends on camera and resolution; retune per deployment.
    pub min_contour_area: f64,
    /// Erosion passes followed by the same number of dilation passes.
    pub morph_iterations: u32,
    /// Side of the square structuring element.
    pub kernel_size: u32,
    pub visualization: VisualizationConfig,
}

/// Visualization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub draw_bboxes: bool,
    pub draw_labels: bool,
    pub draw_distance: bool,
    /// RGB
    pub color: (u8, u8, u8),
    pub thickness: i32,
    pub font_scale: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            class_label: "Apple".to_string(),
            color_mask: HsvRange::new([0, 120, 70], [10, 255, 255]),
            min_contour_area: 500.0,
            morph_iterations: 2,
            kernel_size: 3,
            visualization: VisualizationConfig::default(),
        }
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            draw_bboxes: true,
            draw_labels: true,
            draw_distance: true,
            color: (0, 255, 0),
            thickness: 2,
            font_scale: 0.5,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for channel in 0..3 {
            let (lower, upper) = (self.color_mask.lower[channel], self.color_mask.upper[channel]);
            if lower > upper {
                return Err(ConfigError::InvertedColorBounds {
                    channel,
                    lower,
                    upper,
                });
            }
        }

        if !self.min_contour_area.is_finite() || self.min_contour_area < 0.0 {
            return Err(ConfigError::InvalidMinArea {
                area: self.min_contour_area,
            });
        }

        if self.kernel_size == 0 || self.kernel_size % 2 == 0 || self.kernel_size > MAX_KERNEL_SIZE
        {
            return Err(ConfigError::InvalidKernelSize {
                size: self.kernel_size,
                max: MAX_KERNEL_SIZE,
            });
        }

        if self.morph_iterations > MAX_MORPH_ITERATIONS {
            return Err(ConfigError::TooManyIterations {
                iterations: self.morph_iterations,
                max: MAX_MORPH_ITERATIONS,
            });
        }

        Ok(())
    }

    /// Same settings with a different area threshold.
    pub fn with_min_contour_area(mut self, min_contour_area: f64) -> Self {
        self.min_contour_area = min_contour_area;
        self
    }

    /// Same settings with a different number of morphology passes.
    pub fn with_morph_iterations(mut self, morph_iterations: u32) -> Self {
        self.morph_iterations = morph_iterations;
        self
    }
}
