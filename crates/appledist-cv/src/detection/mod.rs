//! Color-mask object detection

pub mod config;
pub mod processor;

pub use config::{DetectionConfig, HsvRange, VisualizationConfig};
pub use processor::{Detection, Detections, FrameProcessor};
