//! stripcrop: crop the test strip out of a photograph.
//!
//! Reads an image file, locates the strip with the selected strategy,
//! pads the detected rectangle and writes the cropped image. The
//! detection report goes to stdout (text or JSON); logs and the optional
//! stage timing table go to stderr.
//!
//! # Usage
//!
//! ```text
//! stripcrop [OPTIONS] <IMAGE_PATH>
//! stripcrop --strategy contour --output-dir out/ photo.jpg
//! ```
//!
//! Set `RUST_LOG=debug` to see per-stage measurements.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use stripcrop_pipeline::diagnostics::Clock;
use stripcrop_pipeline::{CropConfig, CropError, FailureReport, OutputFormat, Padding, StrategyKind};
use tracing::{debug, error};

use crate::output::Destination;

/// Locate the test strip in a photograph and crop it with a margin.
#[derive(Parser)]
#[command(name = "stripcrop", version)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Path to the input image (JPEG, PNG, WebP, BMP; at most 10 MiB).
    image_path: PathBuf,

    /// Region-location strategy.
    #[arg(long, value_enum, default_value_t = Strategy::Density)]
    strategy: Strategy,

    /// Edge magnitude a pixel must exceed to count towards the density
    /// profiles.
    #[arg(long, default_value_t = CropConfig::DEFAULT_EDGE_THRESHOLD)]
    edge_threshold: u8,

    /// Fraction of a column that must be edge pixels (0-1).
    #[arg(long, default_value_t = CropConfig::DEFAULT_MIN_VERTICAL_CONTINUITY)]
    min_continuity: f64,

    /// Minimum strip width as a fraction of the image width (0-1).
    #[arg(long, default_value_t = CropConfig::DEFAULT_MIN_STRIP_WIDTH_RATIO)]
    min_strip_width: f64,

    /// Margin as a fraction of the detected rectangle's size.
    /// Defaults to 0.05 unless --padding-pixels is given.
    #[arg(long, conflicts_with = "padding_pixels")]
    padding_ratio: Option<f64>,

    /// Fixed margin in pixels on every side.
    #[arg(long)]
    padding_pixels: Option<u32>,

    /// Smallest contour area as a fraction of the image area (0-1).
    #[arg(long, default_value_t = CropConfig::DEFAULT_MIN_AREA_RATIO)]
    min_area: f64,

    /// Largest contour area as a fraction of the image area (0-1).
    #[arg(long, default_value_t = CropConfig::DEFAULT_MAX_AREA_RATIO)]
    max_area: f64,

    /// Polygon approximation tolerance as a fraction of the contour
    /// perimeter.
    #[arg(long, default_value_t = CropConfig::DEFAULT_POLYGON_APPROX_EPSILON)]
    epsilon: f64,

    /// Gaussian kernel size for the contour strategy (odd, 3-31).
    #[arg(long, default_value_t = CropConfig::DEFAULT_GAUSSIAN_KERNEL_SIZE)]
    kernel_size: u32,

    /// Edge magnitude threshold for the contour strategy's binary mask.
    #[arg(long, default_value_t = CropConfig::DEFAULT_MASK_THRESHOLD)]
    mask_threshold: u8,

    /// Gap-closing radius for the contour strategy's mask (0-3).
    #[arg(long, default_value_t = CropConfig::DEFAULT_CLOSE_RADIUS)]
    close_radius: u8,

    /// Full configuration as a JSON string.
    ///
    /// When provided, all other detection flags are ignored. Missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the cropped image to this file.
    #[arg(long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write the cropped image into this directory as
    /// `{name}_cropped_{timestamp}.{ext}`. Defaults to the input's
    /// directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Base name for the output file in --output-dir, replacing the
    /// generated name. Only letters, digits, '-' and '_' are kept.
    #[arg(long, conflicts_with = "output")]
    name: Option<String>,

    /// Output format. Defaults to the --output extension, else PNG.
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Print the detection report as JSON.
    #[arg(long)]
    json: bool,

    /// Print per-stage timing to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Detect only; do not write an output file.
    #[arg(long)]
    dry_run: bool,
}

/// Strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Column/row edge-density scan; always produces a crop.
    Density,
    /// Contour-polygon filtering; may find nothing.
    Contour,
}

impl From<Strategy> for StrategyKind {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Density => Self::DensityProfile,
            Strategy::Contour => Self::ContourPolygon,
        }
    }
}

/// Output format selection.
#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Png,
    Jpeg,
    Bmp,
    Webp,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Png => Self::Png,
            Format::Jpeg => Self::Jpeg,
            Format::Bmp => Self::Bmp,
            Format::Webp => Self::WebP,
        }
    }
}

/// Build a [`CropConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual detection flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<CropConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let padding = match (cli.padding_ratio, cli.padding_pixels) {
        (_, Some(px)) => Padding::Pixels(px),
        (Some(ratio), None) => Padding::Ratio(ratio),
        (None, None) => Padding::default(),
    };

    Ok(CropConfig {
        strategy: cli.strategy.into(),
        edge_threshold: cli.edge_threshold,
        min_vertical_continuity: cli.min_continuity,
        min_strip_width_ratio: cli.min_strip_width,
        padding,
        min_area_ratio: cli.min_area,
        max_area_ratio: cli.max_area,
        polygon_approx_epsilon: cli.epsilon,
        gaussian_kernel_size: cli.kernel_size,
        mask_threshold: cli.mask_threshold,
        close_radius: cli.close_radius,
        ..CropConfig::default()
    })
}

fn destination_from_cli(cli: &Cli) -> Destination {
    if let Some(ref path) = cli.output {
        return Destination::File(path.clone());
    }
    let dir = cli.output_dir.clone().unwrap_or_else(|| {
        cli.image_path
            .parent()
            .map(std::path::Path::to_path_buf)
            .unwrap_or_default()
    });
    Destination::Directory {
        dir,
        name: cli.name.as_deref().and_then(output::sanitize_name),
    }
}

/// Print a pipeline failure in the requested style.
fn report_failure(err: &CropError, json: bool) {
    let report = FailureReport::from(err);
    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Error serializing failure report: {e}"),
        }
    } else {
        eprintln!("Error: {err}");
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    debug!(?config, "configuration");

    let image_bytes = match output::read_input(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("rejected input {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let image = match stripcrop_pipeline::grayscale::decode(&image_bytes) {
        Ok(image) => image,
        Err(e) => {
            report_failure(&e, cli.json);
            return ExitCode::FAILURE;
        }
    };

    let (result, diagnostics) =
        match stripcrop_pipeline::process_with_diagnostics(&image, &config, &StdClock) {
            Ok(pair) => pair,
            Err(e) => {
                report_failure(&e, cli.json);
                return ExitCode::FAILURE;
            }
        };

    if cli.diagnostics {
        eprintln!("{}", diagnostics.report());
    }

    let saved_to = if cli.dry_run {
        None
    } else {
        let destination = destination_from_cli(&cli);
        let format = destination.format(cli.format.map(OutputFormat::from));
        let path = destination.resolve(&cli.image_path, format, chrono::Utc::now());

        let encoded = match stripcrop_pipeline::encode::encode(&result.image, format) {
            Ok(bytes) => bytes,
            Err(e) => {
                report_failure(&e, cli.json);
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = output::write_output(&path, &encoded) {
            error!("could not save cropped image: {e}");
            return ExitCode::FAILURE;
        }
        Some((path, format))
    };

    let report = result.report();
    if cli.json {
        let mut value = match serde_json::to_value(&report) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        };
        value["saved_to"] =
            serde_json::json!(saved_to.as_ref().map(|(p, _)| p.display().to_string()));
        value["mime_type"] = serde_json::json!(saved_to.as_ref().map(|(_, f)| f.mime_type()));
        match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("method:   {}", report.method);
        println!("message:  {}", report.message);
        if let Some(rect) = report.detected {
            println!("detected: {rect}");
        }
        println!("cropped:  {} -> {}", report.padded, report.cropped_size);
        if report.method.is_fallback() {
            println!("note:     low-confidence fallback result");
        }
        if let Some((path, format)) = saved_to {
            println!("saved to: {} ({})", path.display(), format.mime_type());
        }
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
