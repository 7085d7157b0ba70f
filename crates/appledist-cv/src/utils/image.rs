//! Frame conversions between the `image` crate and OpenCV

use crate::Result;
use anyhow::Context;
use opencv::{core::Mat, imgproc, prelude::*};

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Convert image::RgbImage into a BGR Mat, the layout capture devices produce
    pub fn rgb_to_bgr_mat(rgb_image: &image::RgbImage) -> Result<Mat> {
        let height = rgb_image.height() as i32;
        let flat = Mat::from_slice(rgb_image.as_raw())
            .context("Failed to wrap RGB buffer in a Mat")?;
        let rgb = flat
            .reshape(3, height)
            .context("Failed to reshape RGB buffer")?;

        let mut bgr = Mat::default();
        imgproc::cvt_color(&*rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)
            .context("Failed to convert RGB to BGR")?;
        Ok(bgr)
    }

    /// Convert a BGR frame to HSV
    pub fn bgr_to_hsv(frame: &Mat) -> Result<Mat> {
        let mut hsv = Mat::default();
        imgproc::cvt_color(frame, &mut hsv, imgproc::COLOR_BGR2HSV, 0)
            .context("Failed to convert BGR to HSV")?;
        Ok(hsv)
    }
}
