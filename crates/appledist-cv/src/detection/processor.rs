//! Color segmentation, contour filtering and per-detection distance
//!
//! Pipeline for one frame: BGR to HSV, inclusive `in_range` mask, erosion then
//! dilation, external contours, area filter, bounding box, distance from the
//! box width.

use super::config::DetectionConfig;
use crate::Result;
use crate::bbox::BBox;
use crate::error::DetectionError;
use crate::render::Annotator;
use crate::utils::ImageUtils;
use anyhow::Context;
use appledist_core::DistanceEstimator;
use opencv::{
    core::{self, Mat, Point, Size, Vector},
    imgproc,
    prelude::*,
};
use serde::Serialize;
use std::iter::FusedIterator;

/// One object found in one frame. Not tracked across frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub bbox: BBox,
    pub contour_area: f64,
    /// Computed from this detection's own width only.
    pub distance_cm: f64,
}

impl Detection {
    /// Width used for the distance estimate.
    pub fn observed_width_px(&self) -> f64 {
        self.bbox.width as f64
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize detection")
    }
}

/// Lazy pass over the contours of a single frame.
///
/// Contours are filtered and measured as the iterator advances. Order follows
/// contour extraction and is not meaningful.
pub struct Detections<'a> {
    contours: Vector<Vector<Point>>,
    next: usize,
    config: &'a DetectionConfig,
    estimator: &'a DistanceEstimator,
}

impl Detections<'_> {
    fn detect_contour(
        &self,
        contour: &Vector<Point>,
    ) -> std::result::Result<Option<Detection>, DetectionError> {
        let contour_area = imgproc::contour_area(contour, false)?;
        if contour_area <= self.config.min_contour_area {
            return Ok(None);
        }

        let bbox = BBox::from_rect(imgproc::bounding_rect(contour)?).with_class(
            self.config.class_label.clone(),
            self.config.visualization.color,
        );
        let measurement = self.estimator.measure(bbox.width as f64)?;

        Ok(Some(Detection {
            bbox,
            contour_area,
            distance_cm: measurement.distance_cm,
        }))
    }
}

impl Iterator for Detections<'_> {
    type Item = std::result::Result<Detection, DetectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.contours.len() {
            let index = self.next;
            self.next += 1;

            let contour = match self.contours.get(index) {
                Ok(contour) => contour,
                Err(err) => return Some(Err(err.into())),
            };

            match self.detect_contour(&contour) {
                Ok(Some(detection)) => return Some(Ok(detection)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

impl FusedIterator for Detections<'_> {}

/// Stateless per-frame detector
pub struct FrameProcessor {
    config: DetectionConfig,
    annotator: Annotator,
}

impl FrameProcessor {
    pub fn new(config: DetectionConfig) -> Self {
        let annotator = Annotator::new(config.visualization.clone());
        Self { config, annotator }
    }

    /// Binary mask of the pixels inside the configured HSV range
    pub fn color_mask(&self, frame: &Mat) -> Result<Mat> {
        let hsv = ImageUtils::bgr_to_hsv(frame)?;
        self.threshold_hsv(&hsv)
    }

    /// Threshold an HSV image against the configured range, bounds included
    pub fn threshold_hsv(&self, hsv: &Mat) -> Result<Mat> {
        let mut mask = Mat::default();
        core::in_range(
            hsv,
            &self.config.color_mask.lower_scalar(),
            &self.config.color_mask.upper_scalar(),
            &mut mask,
        )
        .context("Failed to threshold frame")?;
        Ok(mask)
    }

    /// Morphological open: erode then dilate, removing speckle
    pub fn reduce_noise(&self, mask: &Mat) -> Result<Mat> {
        let iterations = i32::try_from(self.config.morph_iterations)
            .context("Morphology iteration count out of range")?;
        if iterations == 0 {
            return Ok(mask.try_clone()?);
        }

        let size =
            i32::try_from(self.config.kernel_size).context("Morphology kernel size out of range")?;
        let anchor = Point::new(-1, -1);
        let kernel =
            imgproc::get_structuring_element(imgproc::MORPH_RECT, Size::new(size, size), anchor)?;
        let border_value = imgproc::morphology_default_border_value()?;

        let mut eroded = Mat::default();
        imgproc::erode(
            mask,
            &mut eroded,
            &kernel,
            anchor,
            iterations,
            core::BORDER_CONSTANT,
            border_value,
        )
        .context("Failed to erode mask")?;

        let mut opened = Mat::default();
        imgproc::dilate(
            &eroded,
            &mut opened,
            &kernel,
            anchor,
            iterations,
            core::BORDER_CONSTANT,
            border_value,
        )
        .context("Failed to dilate mask")?;

        Ok(opened)
    }

    /// Detect objects in a BGR frame.
    ///
    /// The estimator is only read. Each detection gets its distance from its
    /// own bounding-box width.
    pub fn detect_objects<'a>(
        &'a self,
        frame: &Mat,
        estimator: &'a DistanceEstimator,
    ) -> Result<Detections<'a>> {
        let mask = self.color_mask(frame)?;
        self.detect_in_mask(&mask, estimator)
    }

    /// Same as [`detect_objects`](Self::detect_objects) for an `image` crate frame
    pub fn detect_in_rgb_image<'a>(
        &'a self,
        rgb_image: &image::RgbImage,
        estimator: &'a DistanceEstimator,
    ) -> Result<Detections<'a>> {
        let frame = ImageUtils::rgb_to_bgr_mat(rgb_image)?;
        self.detect_objects(&frame, estimator)
    }

    /// Run noise reduction, contour extraction and filtering on a ready mask
    pub fn detect_in_mask<'a>(
        &'a self,
        mask: &Mat,
        estimator: &'a DistanceEstimator,
    ) -> Result<Detections<'a>> {
        let cleaned = self.reduce_noise(mask)?;

        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            &cleaned,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )
        .context("Failed to extract contours")?;

        Ok(Detections {
            contours,
            next: 0,
            config: &self.config,
            estimator,
        })
    }

    /// Detect, annotate the frame in place and record the last measured width.
    ///
    /// Detections whose measurement is invalid are logged and skipped. An
    /// uncalibrated model or an OpenCV failure aborts the frame.
    pub fn process_frame(
        &self,
        frame: &mut Mat,
        estimator: &mut DistanceEstimator,
    ) -> Result<Vec<Detection>> {
        let mut kept = Vec::new();

        for item in self.detect_objects(frame, estimator)? {
            match item {
                Ok(detection) => {
                    self.annotator.draw(frame, &detection)?;
                    kept.push(detection);
                }
                Err(err) if err.is_recoverable() => {
                    log::warn!("Skipping detection: {}", err);
                }
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(last) = kept.last() {
            estimator.set_observed_width_px(last.observed_width_px());
        }
        log::debug!("{} detection(s) in frame", kept.len());

        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appledist_core::{CalibrationConfig, EstimatorError};
    use opencv::core::{CV_8UC1, CV_8UC3, Rect, Scalar, Vec3b};

    fn calibrated() -> DistanceEstimator {
        CalibrationConfig::default()
            .calibrated_estimator()
            .unwrap()
    }

    fn blank_mask() -> Mat {
        Mat::new_rows_cols_with_default(240, 320, CV_8UC1, Scalar::all(0.0)).unwrap()
    }

    fn fill(image: &mut Mat, rect: Rect, color: Scalar) {
        imgproc::rectangle(image, rect, color, imgproc::FILLED, imgproc::LINE_8, 0).unwrap();
    }

    /// Green frame with solid red squares, in BGR.
    fn frame_with_red(rects: &[Rect]) -> Mat {
        let mut frame = Mat::new_rows_cols_with_default(
            240,
            320,
            CV_8UC3,
            Scalar::new(0.0, 255.0, 0.0, 0.0),
        )
        .unwrap();
        for rect in rects {
            fill(&mut frame, *rect, Scalar::new(0.0, 0.0, 255.0, 0.0));
        }
        frame
    }

    #[test]
    fn test_small_blob_is_filtered_by_area() -> Result<()> {
        let mut mask = blank_mask();
        fill(&mut mask, Rect::new(10, 10, 2, 5), Scalar::all(255.0));
        fill(&mut mask, Rect::new(150, 100, 50, 100), Scalar::all(255.0));

        let estimator = calibrated();
        for iterations in [0, 2] {
            let config = DetectionConfig::default()
                .with_min_contour_area(500.0)
                .with_morph_iterations(iterations);
            let processor = FrameProcessor::new(config);

            let detections = processor
                .detect_in_mask(&mask, &estimator)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            assert_eq!(detections.len(), 1);
            assert_eq!(detections[0].bbox.to_rect(), Rect::new(150, 100, 50, 100));
            assert!(detections[0].contour_area > 500.0);
        }
        Ok(())
    }

    #[test]
    fn test_area_threshold_is_configurable() -> Result<()> {
        let mut mask = blank_mask();
        fill(&mut mask, Rect::new(20, 20, 30, 30), Scalar::all(255.0));
        fill(&mut mask, Rect::new(150, 100, 50, 100), Scalar::all(255.0));
        let estimator = calibrated();

        let loose = FrameProcessor::new(DetectionConfig::default().with_min_contour_area(500.0));
        assert_eq!(loose.detect_in_mask(&mask, &estimator)?.count(), 2);

        let strict = FrameProcessor::new(DetectionConfig::default().with_min_contour_area(1000.0));
        assert_eq!(strict.detect_in_mask(&mask, &estimator)?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_empty_mask_yields_nothing() -> Result<()> {
        let mut estimator = calibrated();
        let processor = FrameProcessor::new(DetectionConfig::default());

        assert_eq!(processor.detect_in_mask(&blank_mask(), &estimator)?.count(), 0);

        let mut frame = frame_with_red(&[]);
        let detections = processor.process_frame(&mut frame, &mut estimator)?;
        assert!(detections.is_empty());
        assert_eq!(estimator.observed_width_px(), 100.0);
        Ok(())
    }

    #[test]
    fn test_mask_includes_both_bounds() -> Result<()> {
        let pixels = [
            ([0, 120, 70], 255),
            ([10, 255, 255], 255),
            ([11, 200, 200], 0),
            ([5, 119, 200], 0),
        ];
        let mut hsv = Mat::new_rows_cols_with_default(1, 4, CV_8UC3, Scalar::all(0.0))?;
        for (col, (value, _)) in pixels.iter().enumerate() {
            *hsv.at_2d_mut::<Vec3b>(0, col as i32)? = Vec3b::from_array(*value);
        }

        let processor = FrameProcessor::new(DetectionConfig::default());
        let mask = processor.threshold_hsv(&hsv)?;
        for (col, (value, expected)) in pixels.iter().enumerate() {
            assert_eq!(*mask.at_2d::<u8>(0, col as i32)?, *expected, "{value:?}");
        }
        Ok(())
    }

    #[test]
    fn test_oversized_morphology_is_an_error() {
        let mask = blank_mask();
        let processor =
            FrameProcessor::new(DetectionConfig::default().with_morph_iterations(u32::MAX));
        assert!(processor.reduce_noise(&mask).is_err());

        let processor = FrameProcessor::new(DetectionConfig {
            kernel_size: u32::MAX,
            ..Default::default()
        });
        assert!(processor.reduce_noise(&mask).is_err());
    }

    #[test]
    fn test_speckle_removed_by_opening() -> Result<()> {
        let mut mask = blank_mask();
        for i in 0..10 {
            fill(&mut mask, Rect::new(10 + i * 20, 200, 3, 3), Scalar::all(255.0));
        }
        let estimator = calibrated();

        let processor = FrameProcessor::new(DetectionConfig::default().with_min_contour_area(0.0));
        let cleaned = processor.reduce_noise(&mask)?;
        assert_eq!(core::count_non_zero(&cleaned)?, 0);
        assert_eq!(processor.detect_in_mask(&mask, &estimator)?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_red_square_distance() -> Result<()> {
        let estimator = calibrated();
        let processor = FrameProcessor::new(DetectionConfig::default());
        let frame = frame_with_red(&[Rect::new(100, 50, 60, 60)]);

        let detections = processor
            .detect_objects(&frame, &estimator)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        assert_eq!(detections.len(), 1);
        let detection = &detections[0];
        assert_eq!(detection.bbox.width, 60);
        assert_eq!(detection.bbox.class_id, "Apple");
        // 7.5 cm * 600 px / 60 px
        assert_eq!(detection.distance_cm, 75.0);
        assert_eq!(estimator.observed_width_px(), 100.0);
        Ok(())
    }

    #[test]
    fn test_each_detection_uses_its_own_width() -> Result<()> {
        let mut estimator = calibrated();
        let processor = FrameProcessor::new(DetectionConfig::default());
        let mut frame = frame_with_red(&[Rect::new(20, 40, 50, 50), Rect::new(200, 40, 90, 90)]);

        let mut detections = processor.process_frame(&mut frame, &mut estimator)?;
        assert_eq!(detections.len(), 2);

        // The model keeps whichever width was measured last.
        let last_width = detections[1].observed_width_px();
        assert_eq!(estimator.observed_width_px(), last_width);

        detections.sort_by_key(|d| d.bbox.width);
        assert_eq!(detections[0].distance_cm, 90.0);
        assert_eq!(detections[1].distance_cm, 50.0);
        Ok(())
    }

    #[test]
    fn test_rgb_image_input() -> Result<()> {
        let estimator = calibrated();
        let processor = FrameProcessor::new(DetectionConfig::default());
        let rgb = image::RgbImage::from_fn(320, 240, |x, y| {
            if (40..140).contains(&x) && (60..160).contains(&y) {
                image::Rgb([230, 25, 20])
            } else {
                image::Rgb([30, 30, 200])
            }
        });

        let detections = processor
            .detect_in_rgb_image(&rgb, &estimator)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].bbox.width, 100);
        assert_eq!(detections[0].distance_cm, 45.0);
        Ok(())
    }

    #[test]
    fn test_uncalibrated_model_aborts_frame() -> Result<()> {
        let mut estimator = DistanceEstimator::new(7.5, 100.0)?;
        let processor = FrameProcessor::new(DetectionConfig::default());
        let mut frame = frame_with_red(&[Rect::new(100, 50, 60, 60)]);

        let mut detections = processor.detect_objects(&frame, &estimator)?;
        match detections.next() {
            Some(Err(DetectionError::Estimator(EstimatorError::Uncalibrated))) => {}
            other => panic!("expected uncalibrated error, got {:?}", other),
        }
        assert!(detections.next().is_none());
        assert!(detections.next().is_none());

        let err = processor
            .process_frame(&mut frame, &mut estimator)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DetectionError>(),
            Some(DetectionError::Estimator(EstimatorError::Uncalibrated))
        ));
        Ok(())
    }

    #[test]
    fn test_detection_json() -> Result<()> {
        let detection = Detection {
            bbox: BBox::new(1, 2, 3, 4),
            contour_area: 6.0,
            distance_cm: 12.5,
        };
        let json = detection.to_json()?;
        assert!(json.contains("\"distance_cm\":12.5"));
        assert!(json.contains("\"width\":3"));
        Ok(())
    }
}
