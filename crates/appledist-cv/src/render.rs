//! Frame annotation and the on-screen window

use crate::Result;
use crate::detection::{Detection, VisualizationConfig};
use crate::traits::FrameSink;
use anyhow::Context;
use opencv::{
    core::Mat,
    highgui,
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
};

const CLASS_LABEL_OFFSET: i32 = 10;
const DISTANCE_LABEL_OFFSET: i32 = 30;

/// `true` for the key code that ends the session.
pub fn is_quit_key(code: i32) -> bool {
    (code & 0xFF) == i32::from(b'q')
}

/// Draws boxes and labels for detections
pub struct Annotator {
    config: VisualizationConfig,
}

impl Annotator {
    pub fn new(config: VisualizationConfig) -> Self {
        Self { config }
    }

    /// Draw one detection onto a BGR frame
    pub fn draw(&self, frame: &mut Mat, detection: &Detection) -> Result<()> {
        let bbox = &detection.bbox;
        let color = bbox.get_bgr_scalar();

        if self.config.draw_bboxes {
            imgproc::rectangle(
                frame,
                bbox.to_rect(),
                color,
                self.config.thickness,
                LINE_8,
                0,
            )
            .context("Failed to draw bounding box")?;
        }

        if self.config.draw_labels {
            self.put_label(frame, &bbox.class_id, bbox.label_origin(CLASS_LABEL_OFFSET), color)?;
        }

        if self.config.draw_distance {
            let label = format!("Distance: {:.2} cm", detection.distance_cm);
            self.put_label(frame, &label, bbox.label_origin(DISTANCE_LABEL_OFFSET), color)?;
        }

        Ok(())
    }

    fn put_label(
        &self,
        frame: &mut Mat,
        text: &str,
        origin: opencv::core::Point,
        color: opencv::core::Scalar,
    ) -> Result<()> {
        imgproc::put_text(
            frame,
            text,
            origin,
            FONT_HERSHEY_SIMPLEX,
            self.config.font_scale,
            color,
            self.config.thickness,
            LINE_8,
            false,
        )
        .with_context(|| format!("Failed to draw label {:?}", text))
    }
}

/// HighGUI window that shows frames and reports key presses
pub struct HighGuiWindow {
    title: String,
}

impl HighGuiWindow {
    pub fn new(title: &str) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
            .with_context(|| format!("Failed to create window {:?}", title))?;
        Ok(Self {
            title: title.to_string(),
        })
    }
}

impl FrameSink for HighGuiWindow {
    fn show(&mut self, frame: &Mat) -> Result<()> {
        highgui::imshow(&self.title, frame).context("Failed to display frame")
    }

    fn poll_key(&mut self) -> Result<i32> {
        highgui::wait_key(1).context("Failed to poll keyboard")
    }
}

impl Drop for HighGuiWindow {
    fn drop(&mut self) {
        if let Err(err) = highgui::destroy_all_windows() {
            log::warn!("Failed to close windows: {}", err);
        }
    }
}
