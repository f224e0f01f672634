//! autoregion: detect the region under a point in a screenshot or window
//!
//! Prints `x y width height` for the detected rectangle, or the full
//! detection report with `--json`.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use anyhow::{Context, Result};
use autoregion_core::{
    AutoRegionDetector, DetectionReport,
    buffer::PixelBuffer,
    capture::{ImageFileWindow, WindowCapture, WindowSystem, create_default_backend},
    constants,
    diagnostics::PngDumpHook,
    error::{CaptureError, DetectError},
    model::{Bgra, DetectOptions, Point, RectConvention, ThresholdMode, WindowHandle},
    otsu::binarize_with,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autoregion")]
#[command(about = "Detect the uniform region under a point in a screenshot or window")]
struct Cli {
    /// Enable debug logging for the detection pipeline
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect a region in an image file
    Detect {
        /// Input image (png, jpeg, webp)
        #[arg(long)]
        image: PathBuf,
        #[command(flatten)]
        detect: DetectArgs,
    },
    /// Detect a region in a live window
    DetectWindow {
        /// Native window handle, decimal or 0x-prefixed hex
        #[arg(long)]
        handle: WindowHandle,
        #[command(flatten)]
        detect: DetectArgs,
    },
    /// Write the black/white version of an image
    Binarize {
        /// Input image (png, jpeg, webp)
        #[arg(long)]
        image: PathBuf,
        /// Output PNG path
        #[arg(short, long)]
        out: PathBuf,
        /// Gray level 0-255, or `otsu`
        #[arg(long, default_value = "otsu")]
        threshold: ThresholdMode,
    },
}

#[derive(Args)]
struct DetectArgs {
    /// Seed x, relative to the window
    #[arg(long, allow_negative_numbers = true)]
    x: i32,
    /// Seed y, relative to the window
    #[arg(long, allow_negative_numbers = true)]
    y: i32,
    /// Gray level 0-255, or `otsu`
    #[arg(long)]
    threshold: Option<ThresholdMode>,
    /// Fill color as #RRGGBB
    #[arg(long)]
    fill: Option<Bgra>,
    /// Report width/height as max - min instead of the pixel count
    #[arg(long)]
    span: bool,
    /// Write screenshot.png, otsu.png and floodfill.png here
    #[arg(long)]
    dump_dir: Option<PathBuf>,
    /// Print the full report as JSON
    #[arg(long)]
    json: bool,
    /// DetectOptions as JSON; environment and flags apply on top
    #[arg(long)]
    config: Option<PathBuf>,
}

impl DetectArgs {
    fn seed(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Config file, then environment, then flags
    fn options(&self) -> Result<DetectOptions> {
        let base = match &self.config {
            Some(path) => load_config(path)?,
            None => DetectOptions::default(),
        };
        let mut options = base.with_env_overrides();
        if let Some(threshold) = self.threshold {
            options.threshold = threshold;
        }
        if let Some(fill) = self.fill {
            options.fill_color = fill;
        }
        if self.span {
            options.rect_convention = RectConvention::Span;
        }
        Ok(options)
    }

    /// `--dump-dir` as given; the environment root gets one subdirectory
    /// per run
    fn dump_hook(&self) -> Option<PngDumpHook> {
        match &self.dump_dir {
            Some(dir) => Some(PngDumpHook::new(dir)),
            None => constants::dump_dir().map(PngDumpHook::timestamped),
        }
    }
}

fn load_config(path: &Path) -> Result<DetectOptions> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
}

fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let core_level = if verbose { "autoregion_core=debug" } else { "autoregion_core=warn" };
    let filter = EnvFilter::from_default_env()
        .add_directive("autoregion=info".parse()?)
        .add_directive(core_level.parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.verbose, cli.log_json) {
        eprintln!("Failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(hint) = remediation_hint(&e) {
                eprintln!("Hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Detect { image, detect } => {
            let window = ImageFileWindow::open(&image)?;
            let report = run_detection(Arc::new(window), ImageFileWindow::HANDLE, &detect).await?;
            print_report(&report, detect.json)
        }
        Commands::DetectWindow { handle, detect } => {
            let system = create_default_backend()?;
            tracing::info!("Using {} backend", system.backend_type());
            let report = run_detection(system, handle, &detect).await?;
            print_report(&report, detect.json)
        }
        Commands::Binarize {
            image,
            out,
            threshold,
        } => {
            let threshold = binarize(&image, &out, threshold)?;
            println!("{}", threshold);
            Ok(())
        }
    }
}

async fn run_detection(
    system: Arc<dyn WindowSystem>,
    window: WindowHandle,
    args: &DetectArgs,
) -> Result<DetectionReport> {
    let mut detector = AutoRegionDetector::new(system).with_options(args.options()?);
    if let Some(hook) = args.dump_hook() {
        tracing::info!("Dumping pipeline stages to {}", hook.dir().display());
        detector = detector.with_hook(Arc::new(hook));
    }

    let seed = args.seed();
    let report = tokio::task::spawn_blocking(move || detector.detect_report(window, seed))
        .await
        .context("Detection task failed")??;
    Ok(report)
}

fn print_report(report: &DetectionReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        let rect = report.rect;
        println!("{} {} {} {}", rect.x, rect.y, rect.width, rect.height);
    }
    Ok(())
}

/// Writes the black/white image to `out` and returns the applied threshold
fn binarize(image: &Path, out: &Path, threshold: ThresholdMode) -> Result<u8> {
    let window = ImageFileWindow::open(image)?;
    let pixels: PixelBuffer = window.capture_window_pixels(ImageFileWindow::HANDLE)?;
    let binarized = binarize_with(pixels, threshold);
    binarized
        .buffer
        .to_rgba_image()
        .save(out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    tracing::info!("Wrote {}", out.display());
    Ok(binarized.threshold)
}

fn remediation_hint(error: &anyhow::Error) -> Option<&str> {
    if let Some(e) = error.downcast_ref::<DetectError>() {
        return Some(e.remediation_hint());
    }
    error.downcast_ref::<CaptureError>().map(CaptureError::remediation_hint)
}
