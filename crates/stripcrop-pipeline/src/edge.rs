//! Sobel edge magnitude and binary edge masks.
//!
//! [`detect_edges`] turns an intensity map into a gradient-magnitude map
//! using the fixed 3x3 kernel pair
//!
//! ```text
//! Gx = [-1 0 1]    Gy = [-1 -2 -1]
//!      [-2 0 2]         [ 0  0  0]
//!      [-1 0 1]         [ 1  2  1]
//! ```
//!
//! with magnitude `round(sqrt(Gx² + Gy²))` clamped to 255. The kernel
//! needs a full neighborhood, so the outermost rows and columns are zero.
//!
//! The contour strategy additionally needs connected boundaries:
//! [`edge_mask`] thresholds the magnitude map and closes 1-2 pixel gaps
//! with a dilate-then-erode pass ([`imageproc::morphology::close`]).

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;

use crate::types::{EdgeMap, IntensityMap};

/// Mask value for edge pixels.
pub const EDGE: u8 = 255;

/// Compute the Sobel gradient magnitude of every interior pixel.
///
/// Deterministic and side-effect-free. The output has the input's
/// dimensions; row 0, the last row, column 0 and the last column are 0.
/// Maps narrower or shorter than 3 pixels are entirely zero.
#[must_use = "returns the edge map"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn detect_edges(map: &IntensityMap) -> EdgeMap {
    let (width, height) = map.dimensions();
    let mut out = EdgeMap::new(width, height);
    if width < 3 || height < 3 {
        return out;
    }

    let w = width as usize;
    let src = map.as_raw();
    let dst: &mut [u8] = &mut out;
    let at = |x: usize, y: usize| i32::from(src[y * w + x]);

    for y in 1..height as usize - 1 {
        for x in 1..w - 1 {
            let p00 = at(x - 1, y - 1);
            let p10 = at(x, y - 1);
            let p20 = at(x + 1, y - 1);
            let p01 = at(x - 1, y);
            let p21 = at(x + 1, y);
            let p02 = at(x - 1, y + 1);
            let p12 = at(x, y + 1);
            let p22 = at(x + 1, y + 1);

            let gx = (p20 + 2 * p21 + p22) - (p00 + 2 * p01 + p02);
            let gy = (p02 + 2 * p12 + p22) - (p00 + 2 * p10 + p20);

            // |gx|, |gy| <= 1020, so the float is exact and the clamp is
            // the only narrowing.
            let magnitude = f64::from(gx * gx + gy * gy).sqrt().round().min(255.0);
            dst[y * w + x] = magnitude as u8;
        }
    }
    out
}

/// Threshold a magnitude map: [`EDGE`] where the magnitude exceeds
/// `threshold`, 0 elsewhere.
#[must_use = "returns the binary mask"]
pub fn binarize(edges: &EdgeMap, threshold: u8) -> GrayImage {
    GrayImage::from_fn(edges.width(), edges.height(), |x, y| {
        if edges.get_pixel(x, y).0[0] > threshold {
            Luma([EDGE])
        } else {
            Luma([0])
        }
    })
}

/// Morphologically close a binary mask with a `(2r+1)²` square
/// structuring element, bridging gaps of up to `2r` pixels.
///
/// A radius of 0 returns the mask unchanged.
#[must_use = "returns the closed mask"]
pub fn close_gaps(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    imageproc::morphology::close(mask, Norm::LInf, radius)
}

/// Binary edge mask for contour tracing: [`binarize`] then
/// [`close_gaps`].
#[must_use = "returns the binary mask"]
pub fn edge_mask(edges: &EdgeMap, threshold: u8, close_radius: u8) -> GrayImage {
    close_gaps(&binarize(edges, threshold), close_radius)
}

/// Number of pixels whose value exceeds `threshold`.
#[must_use]
pub fn count_above(map: &GrayImage, threshold: u8) -> u64 {
    map.as_raw()
        .iter()
        .map(|&v| u64::from(v > threshold))
        .sum()
}
