// src/main.rs

mod case_resolver;
mod config;
mod parking_analyzer;
mod render;
mod slot_allocator;
mod types;
mod vehicle_detection;
mod width_estimator;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use parking_analyzer::ParkingAnalyzer;
use types::{Config, VehicleType};
use vehicle_detection::YoloDetector;

/// Estimate how many vehicles of a given size class can park along a
/// photographed curbside strip.
#[derive(Debug, Parser)]
#[command(name = "curb-parking", version)]
struct Args {
    /// Photo of the curbside strip. A leading number in the file name
    /// selects the scene case used for type assignment.
    image: PathBuf,

    /// Incoming vehicle type: h (hatchback), se (sedan), s (SUV) or t (truck)
    #[arg(value_parser = VehicleType::parse)]
    vehicle_type: VehicleType,

    /// Configuration file (built-in defaults are used when it does not exist)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output path for the annotated image (default: <input stem>_parking.jpg)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "curb_parking=info,ort=warn".into()),
        )
        .init();

    let args = Args::parse();

    if !args.image.exists() {
        bail!("No input image selected: {} does not exist", args.image.display());
    }

    let config = if args.config.exists() {
        let config = Config::load(&args.config)?;
        info!("✓ Configuration loaded from {}", args.config.display());
        config
    } else {
        info!(
            "Config file {} not found, using built-in defaults",
            args.config.display()
        );
        Config::default()
    };

    let image = image::open(&args.image)
        .with_context(|| format!("Failed to decode image {}", args.image.display()))?
        .to_rgb8();
    info!(
        "Analyzing {} ({}x{}) for an incoming {}",
        args.image.display(),
        image.width(),
        image.height(),
        args.vehicle_type
    );

    let detector = YoloDetector::new(&config.model, &config.detection)?;
    let mut analyzer = ParkingAnalyzer::new(detector, &config);

    let source_name = args
        .image
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let report = analyzer.analyze(&image, source_name, args.vehicle_type)?;

    if report.target_width.is_none() && !report.boxes.is_empty() {
        warn!(
            "Could not determine a width for vehicle type '{}'",
            args.vehicle_type.code()
        );
    } else {
        info!(
            "Total available spaces for a {}: {}",
            args.vehicle_type,
            report.slots.len()
        );
    }

    let annotated = render::render_report(&image, &report);
    let output = args
        .output
        .unwrap_or_else(|| derive_output_path(&args.image));
    annotated
        .save(&output)
        .with_context(|| format!("Failed to save annotated image to {}", output.display()))?;
    info!("✓ Annotated image saved to {}", output.display());

    Ok(())
}

/// Run-scoped output path next to the input, so concurrent runs on
/// different images never collide.
fn derive_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{stem}_parking.jpg"))
}
