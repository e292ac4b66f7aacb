//! Shared types for the stripcrop pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locate::StrategyKind;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `DynamicImage`, the decoded source and cropped output type.
pub use image::DynamicImage;

/// Single-channel luminance map with the source image's dimensions.
pub type IntensityMap = GrayImage;

/// Per-pixel gradient magnitude in `[0, 255]`. Border pixels are zero.
pub type EdgeMap = GrayImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of a decoded image.
    #[must_use]
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count.
    #[must_use]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle in pixel coordinates.
///
/// Every rectangle handed to a caller satisfies `x + width <= image width`,
/// `y + height <= image height` and has a non-zero width and height. Use
/// [`clamp_to`](Self::clamp_to) whenever a rectangle is derived from
/// geometry that is not already bounded by the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle from its origin and size.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle spanning the inclusive column range
    /// `left..=right` and row range `top..=bottom`.
    ///
    /// Inverted bounds produce a zero-sized rectangle.
    #[must_use]
    pub const fn from_bounds(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            x: left,
            y: top,
            width: right.saturating_add(1).saturating_sub(left),
            height: bottom.saturating_add(1).saturating_sub(top),
        }
    }

    /// One past the rightmost column.
    #[must_use]
    pub const fn right(self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// One past the bottom row.
    #[must_use]
    pub const fn bottom(self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Area in pixels.
    #[must_use]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Height divided by width. Zero for a zero-width rectangle.
    #[must_use]
    pub fn aspect_ratio(self) -> f64 {
        if self.width == 0 {
            return 0.0;
        }
        f64::from(self.height) / f64::from(self.width)
    }

    /// Whether the rectangle is non-empty and lies entirely inside an
    /// image of the given dimensions.
    #[must_use]
    pub const fn fits_within(self, dimensions: Dimensions) -> bool {
        self.width > 0
            && self.height > 0
            && self.right() <= dimensions.width as u64
            && self.bottom() <= dimensions.height as u64
    }

    /// Clamp the rectangle into the image bounds.
    ///
    /// Returns `None` when nothing of the rectangle remains inside the
    /// image.
    #[must_use]
    pub fn clamp_to(self, dimensions: Dimensions) -> Option<Self> {
        if self.x >= dimensions.width || self.y >= dimensions.height {
            return None;
        }
        let right = self.x.saturating_add(self.width).min(dimensions.width);
        let bottom = self.y.saturating_add(self.height).min(dimensions.height);
        let clamped = Self::new(self.x, self.y, right - self.x, bottom - self.y);
        (clamped.width > 0 && clamped.height > 0).then_some(clamped)
    }

    /// Overlap with another rectangle, if any.
    #[must_use]
    pub fn intersection(self, other: Self) -> Option<Self> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if u64::from(left) >= right || u64::from(top) >= bottom {
            return None;
        }
        let width = u32::try_from(right - u64::from(left)).ok()?;
        let height = u32::try_from(bottom - u64::from(top)).ok()?;
        Some(Self::new(left, top, width, height))
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Margin added around a detected rectangle before cropping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Fraction of the rectangle's own width (horizontal margin) and
    /// height (vertical margin).
    Ratio(f64),
    /// Fixed margin in pixels on every side.
    Pixels(u32),
}

impl Padding {
    /// Horizontal and vertical margin for the given rectangle.
    ///
    /// Ratio margins are truncated to whole pixels.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn margins(self, rect: Rect) -> (u32, u32) {
        match self {
            Self::Ratio(ratio) => {
                let ratio = ratio.max(0.0);
                (
                    (f64::from(rect.width) * ratio) as u32,
                    (f64::from(rect.height) * ratio) as u32,
                )
            }
            Self::Pixels(px) => (px, px),
        }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::Ratio(CropConfig::DEFAULT_PADDING_RATIO)
    }
}

/// Closed interval of accepted aspect ratios (height / width).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectBand {
    /// Smallest accepted ratio.
    pub min: f64,
    /// Largest accepted ratio.
    pub max: f64,
}

impl AspectBand {
    /// Create a band.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `ratio` lies inside the band (inclusive).
    #[must_use]
    pub fn contains(self, ratio: f64) -> bool {
        (self.min..=self.max).contains(&ratio)
    }
}

/// Pair of aspect-ratio bands: one for strips photographed upright, one
/// for strips photographed sideways.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectBands {
    /// Band for tall shapes (ratio above 1).
    pub tall: AspectBand,
    /// Band for wide shapes (ratio below 1).
    pub wide: AspectBand,
}

impl AspectBands {
    /// Bands used by the contour strategy's strict pass.
    pub const STRICT: Self = Self {
        tall: AspectBand::new(1.5, 15.0),
        wide: AspectBand::new(0.067, 0.67),
    };

    /// Wider bands used by the contour strategy's lenient pass.
    pub const LENIENT: Self = Self {
        tall: AspectBand::new(1.2, 20.0),
        wide: AspectBand::new(0.05, 0.83),
    };

    /// Whether `ratio` falls in either band.
    #[must_use]
    pub fn accepts(self, ratio: f64) -> bool {
        self.tall.contains(ratio) || self.wide.contains(ratio)
    }
}

/// Configuration for one pipeline invocation.
///
/// All parameters have defaults; [`validate`](Self::validate) checks the
/// ranges and is called at the start of every pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Which region-location strategy to run.
    pub strategy: StrategyKind,

    /// Edge magnitude a pixel must exceed to count towards the density
    /// profiles.
    pub edge_threshold: u8,

    /// Fraction of a column (or row) that must be edge pixels for the
    /// density strategy to treat it as part of the strip.
    pub min_vertical_continuity: f64,

    /// Minimum detected strip width as a fraction of the image width.
    /// Narrower detections fall back to the centered slice.
    pub min_strip_width_ratio: f64,

    /// Margin added around the detected rectangle.
    pub padding: Padding,

    /// Smallest contour area kept, as a fraction of the image area.
    pub min_area_ratio: f64,

    /// Largest contour area kept, as a fraction of the image area.
    /// Rejects outlines that trace the photo frame itself.
    pub max_area_ratio: f64,

    /// Polygon approximation tolerance as a fraction of the contour
    /// perimeter.
    pub polygon_approx_epsilon: f64,

    /// Gaussian kernel size used to smooth the intensity map before the
    /// contour strategy. Odd, at least 3.
    pub gaussian_kernel_size: u32,

    /// Edge magnitude a pixel must exceed to enter the contour
    /// strategy's binary mask.
    pub mask_threshold: u8,

    /// Radius of the square structuring element used to close gaps in
    /// the binary mask. Zero disables closing.
    pub close_radius: u8,

    /// Aspect-ratio bands of the contour strategy's strict pass.
    pub strict_bands: AspectBands,

    /// Aspect-ratio bands of the contour strategy's lenient pass.
    pub lenient_bands: AspectBands,
}

impl CropConfig {
    /// Default edge threshold for the density profiles.
    pub const DEFAULT_EDGE_THRESHOLD: u8 = 30;
    /// Default minimum column/row continuity.
    pub const DEFAULT_MIN_VERTICAL_CONTINUITY: f64 = 0.1;
    /// Default minimum strip width ratio.
    pub const DEFAULT_MIN_STRIP_WIDTH_RATIO: f64 = 0.05;
    /// Default padding ratio.
    pub const DEFAULT_PADDING_RATIO: f64 = 0.05;
    /// Default minimum contour area ratio.
    pub const DEFAULT_MIN_AREA_RATIO: f64 = 0.01;
    /// Default maximum contour area ratio.
    pub const DEFAULT_MAX_AREA_RATIO: f64 = 0.95;
    /// Default polygon approximation tolerance.
    pub const DEFAULT_POLYGON_APPROX_EPSILON: f64 = 0.02;
    /// Default Gaussian kernel size.
    pub const DEFAULT_GAUSSIAN_KERNEL_SIZE: u32 = 5;
    /// Default binary mask threshold.
    pub const DEFAULT_MASK_THRESHOLD: u8 = 50;
    /// Default gap-closing radius.
    pub const DEFAULT_CLOSE_RADIUS: u8 = 1;
    /// Largest supported gap-closing radius.
    pub const MAX_CLOSE_RADIUS: u8 = 3;
    /// Largest supported Gaussian kernel size.
    pub const MAX_GAUSSIAN_KERNEL_SIZE: u32 = 31;

    /// Check every field against its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`CropError::InvalidConfig`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), CropError> {
        check_unit("min_vertical_continuity", self.min_vertical_continuity)?;
        check_unit("min_strip_width_ratio", self.min_strip_width_ratio)?;
        check_unit("min_area_ratio", self.min_area_ratio)?;
        check_unit("max_area_ratio", self.max_area_ratio)?;
        if self.max_area_ratio <= self.min_area_ratio {
            return Err(CropError::InvalidConfig(format!(
                "max_area_ratio ({}) must exceed min_area_ratio ({})",
                self.max_area_ratio, self.min_area_ratio,
            )));
        }
        if !(self.polygon_approx_epsilon > 0.0 && self.polygon_approx_epsilon < 1.0) {
            return Err(CropError::InvalidConfig(format!(
                "polygon_approx_epsilon must be in (0, 1), got {}",
                self.polygon_approx_epsilon,
            )));
        }
        if self.gaussian_kernel_size < 3
            || self.gaussian_kernel_size % 2 == 0
            || self.gaussian_kernel_size > Self::MAX_GAUSSIAN_KERNEL_SIZE
        {
            return Err(CropError::InvalidConfig(format!(
                "gaussian_kernel_size must be odd and in 3..={}, got {}",
                Self::MAX_GAUSSIAN_KERNEL_SIZE,
                self.gaussian_kernel_size,
            )));
        }
        if self.close_radius > Self::MAX_CLOSE_RADIUS {
            return Err(CropError::InvalidConfig(format!(
                "close_radius must be at most {}, got {}",
                Self::MAX_CLOSE_RADIUS,
                self.close_radius,
            )));
        }
        if let Padding::Ratio(ratio) = self.padding {
            check_unit("padding ratio", ratio)?;
        }
        check_bands("strict_bands", self.strict_bands)?;
        check_bands("lenient_bands", self.lenient_bands)?;
        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), CropError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CropError::InvalidConfig(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

fn check_bands(name: &str, bands: AspectBands) -> Result<(), CropError> {
    for band in [bands.tall, bands.wide] {
        if !(band.min > 0.0 && band.min < band.max) {
            return Err(CropError::InvalidConfig(format!(
                "{name}: band [{}, {}] must satisfy 0 < min < max",
                band.min, band.max,
            )));
        }
    }
    Ok(())
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            edge_threshold: Self::DEFAULT_EDGE_THRESHOLD,
            min_vertical_continuity: Self::DEFAULT_MIN_VERTICAL_CONTINUITY,
            min_strip_width_ratio: Self::DEFAULT_MIN_STRIP_WIDTH_RATIO,
            padding: Padding::default(),
            min_area_ratio: Self::DEFAULT_MIN_AREA_RATIO,
            max_area_ratio: Self::DEFAULT_MAX_AREA_RATIO,
            polygon_approx_epsilon: Self::DEFAULT_POLYGON_APPROX_EPSILON,
            gaussian_kernel_size: Self::DEFAULT_GAUSSIAN_KERNEL_SIZE,
            mask_threshold: Self::DEFAULT_MASK_THRESHOLD,
            close_radius: Self::DEFAULT_CLOSE_RADIUS,
            strict_bands: AspectBands::STRICT,
            lenient_bands: AspectBands::LENIENT,
        }
    }
}

/// How a rectangle was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Density profiles found the strip's columns.
    DensityProfile,
    /// Density profiles found nothing usable; the horizontally centered
    /// half-width slice was used instead. Low confidence.
    DensityFallback,
    /// A convex quadrilateral with a strip-like aspect ratio.
    ContourStrict,
    /// The largest contour with a loosely strip-like aspect ratio.
    ContourLenient,
    /// No pass of the contour strategy produced a rectangle.
    Undetected,
}

impl DetectionMethod {
    /// Whether this method is a low-confidence fallback.
    #[must_use]
    pub const fn is_fallback(self) -> bool {
        matches!(self, Self::DensityFallback | Self::ContourLenient)
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DensityProfile => f.write_str("density_profile"),
            Self::DensityFallback => f.write_str("density_fallback"),
            Self::ContourStrict => f.write_str("contour_strict"),
            Self::ContourLenient => f.write_str("contour_lenient"),
            Self::Undetected => f.write_str("undetected"),
        }
    }
}

/// Outcome of a region locator. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Whether a rectangle was found.
    pub success: bool,
    /// The rectangle, clamped to the image (present when `success`).
    pub rect: Option<Rect>,
    /// How the rectangle was obtained.
    pub method: DetectionMethod,
    /// Human-readable description of the outcome.
    pub message: String,
}

impl DetectionResult {
    /// A successful detection.
    #[must_use]
    pub fn found(rect: Rect, method: DetectionMethod, message: impl Into<String>) -> Self {
        Self {
            success: true,
            rect: Some(rect),
            method,
            message: message.into(),
        }
    }

    /// A detection that produced no rectangle.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            success: false,
            rect: None,
            method: DetectionMethod::Undetected,
            message: message.into(),
        }
    }
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct CropResult {
    /// The cropped sub-image.
    pub image: DynamicImage,
    /// The locator's result, before padding.
    pub detection: DetectionResult,
    /// The padded rectangle that was cropped.
    pub padded: Rect,
    /// Source image dimensions.
    pub dimensions: Dimensions,
}

impl CropResult {
    /// Serializable summary of the run (everything but the pixels).
    #[must_use]
    pub fn report(&self) -> CropReport {
        CropReport {
            success: true,
            method: self.detection.method,
            message: self.detection.message.clone(),
            detected: self.detection.rect,
            padded: self.padded,
            original_size: self.dimensions,
            cropped_size: Dimensions::of(&self.image),
        }
    }
}

/// Serializable summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropReport {
    /// Always `true`; mirrors [`FailureReport::success`].
    pub success: bool,
    /// How the rectangle was obtained.
    pub method: DetectionMethod,
    /// Locator message.
    pub message: String,
    /// Detected rectangle before padding.
    pub detected: Option<Rect>,
    /// Rectangle that was cropped.
    pub padded: Rect,
    /// Source image dimensions.
    pub original_size: Dimensions,
    /// Output image dimensions.
    pub cropped_size: Dimensions,
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CropError {
    /// The input could not be decoded, or decoded to an empty image.
    #[error("failed to decode image: {0}")]
    DecodeFailed(String),

    /// The image is smaller than the 3x3 gradient kernel.
    #[error("image is {width}x{height}; at least 3x3 pixels are required")]
    ImageTooSmall {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// The contour strategy found no strip-like region.
    #[error("no test strip region found: {0}")]
    NoRegionFound(String),

    /// Pipeline configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal fault (overflow guard, encoder failure).
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}

/// Serializable classification of a [`CropError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// See [`CropError::DecodeFailed`].
    DecodeFailed,
    /// See [`CropError::ImageTooSmall`].
    ImageTooSmall,
    /// See [`CropError::NoRegionFound`].
    NoRegionFound,
    /// See [`CropError::InvalidConfig`].
    InvalidConfig,
    /// See [`CropError::ProcessingFailed`].
    ProcessingFailed,
}

impl CropError {
    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::DecodeFailed(_) => FailureKind::DecodeFailed,
            Self::ImageTooSmall { .. } => FailureKind::ImageTooSmall,
            Self::NoRegionFound(_) => FailureKind::NoRegionFound,
            Self::InvalidConfig(_) => FailureKind::InvalidConfig,
            Self::ProcessingFailed(_) => FailureKind::ProcessingFailed,
        }
    }
}

/// Structured failure returned across the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Always `false`.
    pub success: bool,
    /// Failure classification.
    pub reason: FailureKind,
    /// Human-readable message.
    pub message: String,
}

impl From<&CropError> for FailureReport {
    fn from(err: &CropError) -> Self {
        Self {
            success: false,
            reason: err.kind(),
            message: err.to_string(),
        }
    }
}
