use anyhow::{Context, Result};
use appledist_cv::{session, CameraSource, FrameProcessor, HighGuiWindow, SessionSummary};
use config::AppConfig;
use std::process::ExitCode;

mod config;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(summary) => {
            log::debug!("{:?}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<SessionSummary> {
    let config = AppConfig::load()?;
    config.validate()?;

    let mut camera = CameraSource::open(config.device_index)?;

    let mut estimator = config
        .calibration
        .calibrated_estimator()
        .context("Calibration failed")?;
    if let Some(focal_length) = estimator.focal_length() {
        println!("Calibrated Focal Length: {:.2}", focal_length);
    }

    let processor = FrameProcessor::new(config.detection.clone());
    let mut window = HighGuiWindow::new(&config.window_title)?;

    session::run(&mut camera, &mut window, &processor, &mut estimator)
}
