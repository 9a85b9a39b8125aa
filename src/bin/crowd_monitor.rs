//! crowd_monitor - interactive crowd density monitor
//!
//! This binary:
//! 1. Asks whether to read from the webcam or a video file and opens it
//! 2. Creates the alert snapshot directory
//! 3. Loads the person detector once
//! 4. Runs the frame loop until quit, end of stream or a read failure
//!
//! Keys (one per input line): `q` quits, `p` pauses, any key resumes.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use crowd_monitor::prompt::select_and_open;
use crowd_monitor::{
    open_source, AlertEngine, FrameLoop, JpegPersister, MonitorConfig, MonitorError,
    OverlayRenderer, PersonDetector, SourceId, SyntheticCrowdDetector, TerminalDisplay,
};

const WINDOW_TITLE: &str = "Crowd Monitor";

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// YOLOv8 ONNX person model (requires the backend-tract feature).
    /// Without it a synthetic crowd detector is used.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Square input size the model expects.
    #[arg(long, default_value_t = 640)]
    model_input: u32,
    /// TrueType font for text overlays. Without it only boxes are drawn.
    #[arg(long)]
    font: Option<PathBuf>,
    /// Seed for the synthetic crowd detector.
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = MonitorConfig::default();
    cfg.validate()?;

    let opened = {
        let mut stdin = std::io::stdin().lock();
        let mut stdout = std::io::stdout();
        select_and_open(&mut stdin, &mut stdout, |id: &SourceId| {
            open_source(id).map(|source| (id.clone(), source))
        })
    };
    let (source_id, source) = match opened {
        Ok(opened) => opened,
        Err(e) => match e.downcast_ref::<MonitorError>() {
            Some(MonitorError::InvalidMode(mode)) => {
                log::debug!("rejected mode selection '{}'", mode);
                println!("Invalid option. Exiting.");
                return Ok(ExitCode::SUCCESS);
            }
            Some(err @ MonitorError::SourceOpen { .. }) => {
                log::error!("{}", err);
                eprintln!("Error: cannot open camera or video");
                return Ok(ExitCode::FAILURE);
            }
            _ => return Err(e),
        },
    };

    let mut alerts = AlertEngine::new(cfg.thresholds, &cfg.alert_storage_dir, JpegPersister);
    alerts.prepare_storage()?;

    let detector = build_detector(&args)?;
    let renderer = match &args.font {
        Some(path) => OverlayRenderer::from_font_file(path)?,
        None => {
            log::info!("no --font given; text overlays disabled");
            OverlayRenderer::boxes_only()
        }
    };

    let display = TerminalDisplay::new(WINDOW_TITLE)?;

    log::info!(
        "monitoring {}: count >= {}, ratio >= {:.2}, confidence > {:.2}, {}x{}, alerts in {}",
        source_id,
        cfg.thresholds.person_count,
        cfg.thresholds.occupied_ratio,
        cfg.confidence_threshold,
        cfg.canonical_width,
        cfg.canonical_height,
        cfg.alert_storage_dir.display()
    );

    let mut frame_loop = FrameLoop::new(&cfg, source, detector, display, alerts, renderer);
    let summary = frame_loop.run()?;

    println!("monitor summary:");
    println!("  frames processed: {}", summary.frames_processed);
    println!("  alerts raised: {}", summary.alerts_raised);
    if summary.failed_snapshots > 0 {
        println!("  snapshots not saved: {}", summary.failed_snapshots);
    }
    println!("  snapshots: {}", cfg.alert_storage_dir.display());
    Ok(ExitCode::SUCCESS)
}

fn build_detector(args: &Args) -> Result<Box<dyn PersonDetector>> {
    match &args.model {
        #[cfg(feature = "backend-tract")]
        Some(path) => {
            let detector = crowd_monitor::detect::TractDetector::new(path, args.model_input)?;
            log::info!("loaded person model {}", path.display());
            Ok(Box::new(detector))
        }
        #[cfg(not(feature = "backend-tract"))]
        Some(path) => Err(anyhow::anyhow!(
            "--model {} (input {}) requires the backend-tract feature",
            path.display(),
            args.model_input
        )),
        None => {
            log::warn!("no --model given; using the synthetic crowd detector");
            Ok(Box::new(SyntheticCrowdDetector::new(args.seed)))
        }
    }
}
