//! Padding and sub-image extraction.

use image::DynamicImage;

use crate::types::{CropError, Dimensions, Padding, Rect};

/// Expand `rect` by the configured margin, clamped to the image.
///
/// ```text
/// x' = max(0, x - padX)        w' = min(W - x', w + 2·padX)
/// y' = max(0, y - padY)        h' = min(H - y', h + 2·padY)
/// ```
///
/// A zero margin returns the rectangle unchanged, so padding is
/// idempotent at zero.
///
/// # Errors
///
/// Returns [`CropError::ProcessingFailed`] if `rect` does not already lie
/// inside `dimensions`.
pub fn pad(rect: Rect, dimensions: Dimensions, padding: Padding) -> Result<Rect, CropError> {
    if !rect.fits_within(dimensions) {
        return Err(CropError::ProcessingFailed(format!(
            "cannot pad {rect}: it does not fit in {dimensions}"
        )));
    }
    let (pad_x, pad_y) = padding.margins(rect);

    let x = rect.x.saturating_sub(pad_x);
    let y = rect.y.saturating_sub(pad_y);
    let width = grow(rect.width, pad_x, dimensions.width - x);
    let height = grow(rect.height, pad_y, dimensions.height - y);
    Ok(Rect::new(x, y, width, height))
}

/// `min(limit, size + 2 * margin)` without overflow.
fn grow(size: u32, margin: u32, limit: u32) -> u32 {
    let grown = u64::from(size) + 2 * u64::from(margin);
    u32::try_from(grown).map_or(limit, |g| g.min(limit))
}

/// Copy the pixels inside `rect` into a new image.
///
/// The source is only read.
///
/// # Errors
///
/// Returns [`CropError::ProcessingFailed`] if `rect` is empty or extends
/// past the image.
pub fn crop(image: &DynamicImage, rect: Rect) -> Result<DynamicImage, CropError> {
    let dimensions = Dimensions::of(image);
    if !rect.fits_within(dimensions) {
        return Err(CropError::ProcessingFailed(format!(
            "crop rectangle {rect} does not fit in {dimensions}"
        )));
    }
    Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
}

/// Intersection-over-union of two rectangles, in `[0, 1]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn iou(a: Rect, b: Rect) -> f64 {
    let inter = a.intersection(b).map_or(0, Rect::area);
    let union = a.area() + b.area() - inter;
    if union == 0 {
        return 0.0;
    }
    inter as f64 / union as f64
}
