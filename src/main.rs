//! Motion extraction demo driver.
//!
//! Feeds frames from the synthetic source through the extractor and
//! reports mask coverage, standing in for a real decoder-backed host.

use clap::Parser;
use motion_mask::{
    DetectorSettings, MotionExtractor, PixelBuffer, SyntheticSource, VideoSource,
    BYTES_PER_PIXEL,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "motion-mask")]
#[command(about = "Streaming motion extraction over a synthetic video source")]
#[command(version)]
struct Cli {
    /// Source frame width in pixels
    #[arg(long, default_value = "96")]
    width: usize,

    /// Source frame height in pixels
    #[arg(long, default_value = "72")]
    height: usize,

    /// Source frame rate
    #[arg(long, default_value = "30.0")]
    fps: f64,

    /// Number of frames to process (ignored if --continuous)
    #[arg(short = 'n', long, default_value = "300")]
    frames: u64,

    /// Run until interrupted
    #[arg(long)]
    continuous: bool,

    /// Maintain and report the wall-clock throughput counter
    #[arg(long)]
    benchmark: bool,

    /// Path to a TOML settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Sensitivity override (1-127)
    #[arg(long)]
    sensitivity: Option<u8>,

    /// Settle time override in seconds (1-60)
    #[arg(long)]
    settle_time: Option<f64>,

    /// Erosion level override (0-8, 0 disables morphology)
    #[arg(long)]
    erosion: Option<u8>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let settings = match resolve_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid settings: {e}");
            std::process::exit(1);
        }
    };

    let mut extractor = match MotionExtractor::new(cli.width, cli.height, cli.fps, cli.benchmark)
    {
        Ok(extractor) => extractor,
        Err(e) => {
            eprintln!("Cannot build extractor: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = extractor.apply_settings(&settings) {
        eprintln!("Invalid settings: {e}");
        std::process::exit(1);
    }

    info!("motion-mask v{}", motion_mask::VERSION);

    let frame_limit = if cli.continuous { u64::MAX } else { cli.frames };
    let mut source = SyntheticSource::new(cli.width, cli.height, cli.fps)
        .with_frame_limit(frame_limit);

    let running = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
    if cli.continuous {
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, std::sync::atomic::Ordering::SeqCst);
        })
        .ok();
    }

    let mut processed = 0u64;
    let mut peak_coverage = 0.0f64;

    while running.load(std::sync::atomic::Ordering::SeqCst) {
        let timed = match source.next_frame() {
            Ok(Some(timed)) => timed,
            Ok(None) => break,
            Err(e) => {
                warn!("Frame read failed: {}", e);
                continue;
            }
        };

        let mask = match extractor.generate_motion_mask(&timed.frame) {
            Ok(mask) => mask,
            Err(e) => {
                warn!("Frame rejected: {}", e);
                continue;
            }
        };

        let area = (mask.total_size() / BYTES_PER_PIXEL) as f64;
        let moving = mask
            .data()
            .iter()
            .step_by(BYTES_PER_PIXEL)
            .filter(|&&b| b > 0)
            .count() as f64;
        let coverage = 100.0 * moving / area;
        peak_coverage = peak_coverage.max(coverage);
        processed += 1;

        if processed % 30 == 0 {
            if cli.benchmark {
                info!(
                    "pts {}: {:.1}% moving, {} masks/s",
                    timed.pts,
                    coverage,
                    extractor.detector_fps()
                );
            } else {
                info!("pts {}: {:.1}% moving", timed.pts, coverage);
            }
        }
    }

    info!(
        "Finished: {} frames processed, peak coverage {:.1}%",
        processed, peak_coverage
    );
}

fn resolve_settings(cli: &Cli) -> Result<DetectorSettings, motion_mask::ConfigError> {
    let mut settings = match &cli.config {
        Some(path) => DetectorSettings::from_file(path)?,
        None => DetectorSettings::default(),
    };
    if let Some(v) = cli.sensitivity {
        settings.sensitivity = v;
    }
    if let Some(v) = cli.settle_time {
        settings.settle_time = v;
    }
    if let Some(v) = cli.erosion {
        settings.erosion_level = v;
    }
    settings.validate()?;
    Ok(settings)
}
