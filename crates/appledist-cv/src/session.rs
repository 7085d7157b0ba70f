//! Capture loop
//!
//! Single-threaded and blocking: read a frame, detect and annotate, show it,
//! poll the keyboard. Ends on `q`, at end of stream, or on a read failure.

use crate::Result;
use crate::detection::FrameProcessor;
use crate::render::is_quit_key;
use crate::traits::{FrameSink, FrameSource};
use appledist_core::DistanceEstimator;
use serde::Serialize;

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    QuitKey,
    EndOfStream,
    ReadFailed,
}

/// Totals for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub frames: u64,
    pub detections: u64,
    pub stop_reason: StopReason,
}

/// Run until the user quits or the source runs dry.
///
/// Only model and display errors are returned; stream problems end the loop
/// with a [`StopReason`].
pub fn run<S, K>(
    source: &mut S,
    sink: &mut K,
    processor: &FrameProcessor,
    estimator: &mut DistanceEstimator,
) -> Result<SessionSummary>
where
    S: FrameSource,
    K: FrameSink,
{
    let mut frames = 0;
    let mut detections = 0;

    let stop_reason = loop {
        let mut frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("Video stream ended");
                break StopReason::EndOfStream;
            }
            Err(err) => {
                log::error!("Failed to capture frame. Exiting... ({})", err);
                break StopReason::ReadFailed;
            }
        };

        let found = processor.process_frame(&mut frame, estimator)?;
        frames += 1;
        detections += found.len() as u64;

        sink.show(&frame)?;
        if is_quit_key(sink.poll_key()?) {
            break StopReason::QuitKey;
        }
    };

    log::info!(
        "Session finished after {} frame(s), {} detection(s): {:?}",
        frames,
        detections,
        stop_reason
    );

    Ok(SessionSummary {
        frames,
        detections,
        stop_reason,
    })
}
