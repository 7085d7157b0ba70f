//! Bounding boxes of detected objects
//!
//! Pixel-space rectangles as returned by contour bounding, plus the label and
//! color used when drawing them.

use opencv::core::{Point, Rect, Scalar};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub class_id: String,
    pub color: (u8, u8, u8),
}

impl BBox {
    /// Create a new bounding box
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            class_id: String::new(),
            color: (255, 255, 255),
        }
    }

    /// Create from OpenCV Rect
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x, rect.y, rect.width, rect.height)
    }

    /// Convert to OpenCV Rect
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Point `offset` pixels above the top-left corner, where labels go.
    pub fn label_origin(&self, offset: i32) -> Point {
        Point::new(self.x, self.y - offset)
    }

    /// Set class information
    pub fn with_class(mut self, class_id: String, color: (u8, u8, u8)) -> Self {
        self.class_id = class_id;
        self.color = color;
        self
    }

    /// Get OpenCV color scalar (BGR format)
    pub fn get_bgr_scalar(&self) -> Scalar {
        Scalar::new(
            self.color.2 as f64, // B
            self.color.1 as f64, // G
            self.color.0 as f64, // R
            255.0,
        )
    }
}
