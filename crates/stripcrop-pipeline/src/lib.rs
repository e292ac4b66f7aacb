//! stripcrop-pipeline: test-strip detection and cropping (sans-IO).
//!
//! Finds the rectangular test strip in a photograph and crops it out:
//! intensity -> optional blur -> Sobel edges -> region location ->
//! padding -> crop.
//!
//! Two interchangeable strategies locate the strip (see [`locate`]):
//! a column/row edge-density scan that always returns a rectangle, and
//! a contour-polygon filter that can report that nothing strip-like was
//! found. Both are selected through [`CropConfig::strategy`].
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! images or byte slices and returns structured data. Every invocation
//! is independent; no state is shared between calls.

pub mod blur;
pub mod contour;
pub mod crop;
pub mod density;
pub mod diagnostics;
pub mod edge;
pub mod encode;
pub mod grayscale;
pub mod locate;
pub mod polygon;
pub mod types;

use std::time::Duration;

use tracing::info;

use crate::diagnostics::{
    Clock, NullClock, PipelineDiagnostics, PipelineSummary, StageDiagnostics, StageMetrics, timed,
};

pub use encode::OutputFormat;
pub use locate::{RegionLocator, StrategyKind};
pub use types::{
    CropConfig, CropError, CropReport, CropResult, DetectionMethod, DetectionResult, Dimensions,
    DynamicImage, FailureReport, Padding, Rect,
};

/// Decode raw image bytes and run the pipeline.
///
/// # Errors
///
/// Returns [`CropError::DecodeFailed`] if the bytes are empty or not a
/// supported image, and otherwise the errors of [`process_image`].
pub fn process(image_bytes: &[u8], config: &CropConfig) -> Result<CropResult, CropError> {
    let image = grayscale::decode(image_bytes)?;
    process_image(&image, config)
}

/// Run the pipeline on a decoded image.
///
/// # Errors
///
/// Returns [`CropError::InvalidConfig`] for an out-of-range configuration,
/// [`CropError::ImageTooSmall`] for images under 3x3 pixels,
/// [`CropError::NoRegionFound`] when the contour strategy finds nothing,
/// and [`CropError::ProcessingFailed`] for internal faults.
pub fn process_image(image: &DynamicImage, config: &CropConfig) -> Result<CropResult, CropError> {
    process_with_diagnostics(image, config, &NullClock).map(|(result, _)| result)
}

/// Locate the strip without cropping.
///
/// Returns the locator's result as-is: for the contour strategy an
/// unsuccessful result is `Ok` here, not an error.
///
/// # Errors
///
/// Same as [`process_image`], except that [`CropError::NoRegionFound`] is
/// never returned.
pub fn detect(image: &DynamicImage, config: &CropConfig) -> Result<DetectionResult, CropError> {
    config.validate()?;
    let dimensions = Dimensions::of(image);
    grayscale::check_dimensions(dimensions)?;

    let map = grayscale::to_intensity(image);
    let map = if config.strategy.smooths_input() {
        blur::gaussian_blur(&map, config.gaussian_kernel_size)
    } else {
        map
    };
    let edges = edge::detect_edges(&map);
    config.strategy.locate(&edges, dimensions, config)
}

/// Run the pipeline, timing each stage with `clock`.
///
/// # Errors
///
/// Same as [`process_image`].
pub fn process_with_diagnostics<C: Clock>(
    image: &DynamicImage,
    config: &CropConfig,
    clock: &C,
) -> Result<(CropResult, PipelineDiagnostics), CropError> {
    let run_start = clock.now();

    config.validate()?;
    let dimensions = Dimensions::of(image);
    grayscale::check_dimensions(dimensions)?;

    let (map, grayscale_time) = timed(clock, || grayscale::to_intensity(image));
    let grayscale_diag = StageDiagnostics {
        duration: grayscale_time,
        metrics: StageMetrics::Grayscale {
            width: dimensions.width,
            height: dimensions.height,
        },
    };

    let (map, blur_diag) = if config.strategy.smooths_input() {
        let (blurred, duration) =
            timed(clock, || blur::gaussian_blur(&map, config.gaussian_kernel_size));
        let diag = StageDiagnostics {
            duration,
            metrics: StageMetrics::Blur {
                kernel_size: config.gaussian_kernel_size,
                sigma: blur::sigma_for_kernel(config.gaussian_kernel_size),
            },
        };
        (blurred, Some(diag))
    } else {
        (map, None)
    };

    let (edges, edge_time) = timed(clock, || edge::detect_edges(&map));
    let edge_diag = StageDiagnostics {
        duration: edge_time,
        metrics: StageMetrics::EdgeDetection {
            threshold: config.edge_threshold,
            edge_pixel_count: edge::count_above(&edges, config.edge_threshold),
            total_pixel_count: dimensions.area(),
        },
    };

    let (detection, locate_time) =
        timed(clock, || config.strategy.locate(&edges, dimensions, config));
    let detection = detection?;
    let locate_diag = StageDiagnostics {
        duration: locate_time,
        metrics: StageMetrics::Locate {
            strategy: config.strategy.to_string(),
            method: detection.method.to_string(),
            rect: detection.rect,
        },
    };
    let Some(rect) = detection.rect.filter(|_| detection.success) else {
        return Err(CropError::NoRegionFound(detection.message));
    };

    let (cropped, crop_time) = timed(clock, || {
        let padded = crop::pad(rect, dimensions, config.padding)?;
        crop::crop(image, padded).map(|image| (image, padded))
    });
    let (cropped, padded) = cropped?;
    let crop_diag = StageDiagnostics {
        duration: crop_time,
        metrics: StageMetrics::Crop { padded },
    };

    info!(
        strategy = %config.strategy,
        method = %detection.method,
        %rect,
        %padded,
        "strip cropped"
    );

    let total_duration: Duration = clock.elapsed(&run_start);
    let result = CropResult {
        image: cropped,
        detection,
        padded,
        dimensions,
    };
    let diagnostics = PipelineDiagnostics {
        grayscale: grayscale_diag,
        blur: blur_diag,
        edge_detection: edge_diag,
        locate: locate_diag,
        crop: crop_diag,
        total_duration,
        summary: PipelineSummary {
            image_width: dimensions.width,
            image_height: dimensions.height,
            pixel_count: dimensions.area(),
            cropped_width: padded.width,
            cropped_height: padded.height,
        },
    };
    Ok((result, diagnostics))
}
