use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slotfit::config::FitConfig;
use slotfit::{Frame, Size};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

/// Fit video frames into conference grid slots:
/// - scale to cover the slot, keep the aspect ratio
/// - center-crop the overflow
#[derive(Parser, Debug)]
#[command(name = "slotfit")]
#[command(about = "Fill video tiles edge to edge without distortion")]
struct Args {
    /// JSON config file (fallback size, grid spacing)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug events (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit an image file into a slot and write the result
    Fit {
        /// Input image (any format the image crate decodes)
        input: PathBuf,
        /// Output image; format follows the extension
        output: PathBuf,
        /// Slot width; 0 or less means "not laid out yet"
        #[arg(short = 'W', long, allow_negative_numbers = true)]
        width: i32,
        /// Slot height; 0 or less means "not laid out yet"
        #[arg(short = 'H', long, allow_negative_numbers = true)]
        height: i32,
        /// Override the fallback size, e.g. 640x360
        #[arg(long)]
        fallback: Option<String>,
    },
    /// Print the slot rectangles of the grid for N participants
    Grid {
        /// Number of participants with video
        #[arg(short, long)]
        participants: usize,
        /// Display area, e.g. 1280x720
        #[arg(short, long, default_value = "1280x720")]
        display: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => FitConfig::from_json_file(path)?,
        None => FitConfig::default(),
    };

    match args.command {
        Command::Fit {
            input,
            output,
            width,
            height,
            fallback,
        } => {
            if let Some(spec) = fallback {
                let size = parse_dimensions(&spec)?;
                config.fallback_width = size.w;
                config.fallback_height = size.h;
                config.validate()?;
            }
            fit_file(&config, &input, &output, width, height)
        }
        Command::Grid {
            participants,
            display,
        } => {
            let display = parse_dimensions(&display)?;
            let layout = config.grid_layout(display);
            for rect in layout.slot_rects(participants) {
                println!(
                    "slot {:>2} (row {}, col {}): {}x{} at ({}, {})",
                    rect.index, rect.row, rect.col, rect.width, rect.height, rect.x, rect.y
                );
            }
            Ok(())
        }
    }
}

fn fit_file(
    config: &FitConfig,
    input: &Path,
    output: &Path,
    width: i32,
    height: i32,
) -> Result<()> {
    let fitter = config.fitter()?;
    let decoded = image::open(input)
        .with_context(|| format!("failed to decode {}", input.display()))?
        .to_rgba8();
    let frame = Frame::from_rgba_image(decoded)?;

    let target = fitter.resolve_target(width, height);
    let fitted = fitter.fit(&frame, width, height)?;
    fitted
        .to_rgba_image()?
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        src_width = frame.width,
        src_height = frame.height,
        width = fitted.width,
        height = fitted.height,
        fallback = target.fallback_applied,
        "fitted"
    );
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("slotfit={level}")));
    fmt().with_env_filter(filter).with_target(true).init();
}

/// Parse "WIDTHxHEIGHT" into a size with both sides positive
fn parse_dimensions(spec: &str) -> Result<Size> {
    let (w, h) = spec
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("Invalid dimensions: {}. Use WIDTHxHEIGHT, e.g. 400x300", spec))?;
    let w: u32 = w.trim().parse().with_context(|| format!("Invalid width in {}", spec))?;
    let h: u32 = h.trim().parse().with_context(|| format!("Invalid height in {}", spec))?;
    if w == 0 || h == 0 {
        anyhow::bail!("Dimensions must be positive: {}", spec);
    }
    Ok(Size::new(w, h))
}
