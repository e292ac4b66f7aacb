//! Image decoding and intensity conversion.
//!
//! Raw bytes in, [`DynamicImage`] out, then a single-channel
//! [`IntensityMap`] for edge detection. The source image itself is never
//! modified; the cropper reads from it at the end of the pipeline.

use image::DynamicImage;

use crate::types::{CropError, Dimensions, IntensityMap};

/// Smallest width and height the 3x3 gradient kernel can handle.
pub const MIN_SIDE: u32 = 3;

/// Decode raw image bytes (PNG, JPEG, BMP, WebP).
///
/// # Errors
///
/// Returns [`CropError::DecodeFailed`] if `bytes` is empty, the format is
/// unrecognized, the data is corrupt, or the image has no pixels.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, CropError> {
    if bytes.is_empty() {
        return Err(CropError::DecodeFailed("input image data is empty".to_string()));
    }

    let image =
        image::load_from_memory(bytes).map_err(|e| CropError::DecodeFailed(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(CropError::DecodeFailed("decoded image has no pixels".to_string()));
    }
    Ok(image)
}

/// Reject images the pipeline cannot process.
///
/// # Errors
///
/// Returns [`CropError::DecodeFailed`] for an empty image and
/// [`CropError::ImageTooSmall`] when either side is below [`MIN_SIDE`].
pub fn check_dimensions(dimensions: Dimensions) -> Result<(), CropError> {
    if dimensions.width == 0 || dimensions.height == 0 {
        return Err(CropError::DecodeFailed(format!(
            "image is empty ({dimensions})"
        )));
    }
    if dimensions.width < MIN_SIDE || dimensions.height < MIN_SIDE {
        return Err(CropError::ImageTooSmall {
            width: dimensions.width,
            height: dimensions.height,
        });
    }
    Ok(())
}

/// Convert to a single-channel intensity map.
///
/// Uses the `image` crate's luminance weights (Rec. 709:
/// `0.2126*R + 0.7152*G + 0.0722*B`). Alpha is ignored. The output has
/// the same dimensions as the input.
#[must_use = "returns the intensity map"]
pub fn to_intensity(image: &DynamicImage) -> IntensityMap {
    image.to_luma8()
}
