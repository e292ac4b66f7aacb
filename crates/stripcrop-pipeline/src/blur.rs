//! Gaussian smoothing of the intensity map.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`]. The blur is specified
//! by an odd kernel size, converted to a standard deviation with the
//! usual `0.3 * ((k - 1) / 2 - 1) + 0.8` rule. `imageproc` samples
//! beyond the border by clamping, so dimensions are preserved.
//!
//! Only the contour strategy smooths its input: the binary mask it
//! traces is sensitive to isolated noisy pixels.

use crate::types::IntensityMap;

/// Standard deviation equivalent to a Gaussian kernel of `kernel_size`
/// taps.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    let k = kernel_size as f32;
    0.3f32.mul_add((k - 1.0).mul_add(0.5, -1.0), 0.8)
}

/// Blur an intensity map with a Gaussian of the given kernel size.
///
/// Kernel sizes below 3 return the map unchanged, since a 1-tap kernel
/// is the identity and `imageproc` panics on a non-positive sigma.
#[must_use = "returns the blurred map"]
pub fn gaussian_blur(map: &IntensityMap, kernel_size: u32) -> IntensityMap {
    if kernel_size < 3 {
        return map.clone();
    }

    imageproc::filter::gaussian_blur_f32(map, sigma_for_kernel(kernel_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test map with a sharp black-to-white boundary at x=5.
    fn sharp_edge_map() -> IntensityMap {
        IntensityMap::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn sigma_matches_common_kernel_sizes() {
        assert!((sigma_for_kernel(3) - 0.8).abs() < 1e-6);
        assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-6);
        assert!((sigma_for_kernel(7) - 1.4).abs() < 1e-6);
    }

    #[test]
    fn tiny_kernel_returns_identical_map() {
        let map = sharp_edge_map();
        assert_eq!(gaussian_blur(&map, 1), map);
        assert_eq!(gaussian_blur(&map, 0), map);
    }

    #[test]
    fn output_dimensions_preserved() {
        let map = IntensityMap::new(17, 31);
        let blurred = gaussian_blur(&map, 5);
        assert_eq!(blurred.dimensions(), (17, 31));
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let blurred = gaussian_blur(&sharp_edge_map(), 5);

        let left_of_edge = blurred.get_pixel(4, 5).0[0];
        let right_of_edge = blurred.get_pixel(5, 5).0[0];

        assert!(
            left_of_edge > 0,
            "expected blur to raise left-of-edge above 0, got {left_of_edge}",
        );
        assert!(
            right_of_edge < 255,
            "expected blur to lower right-of-edge below 255, got {right_of_edge}",
        );
    }

    #[test]
    fn uniform_map_unchanged_by_blur() {
        let map = IntensityMap::from_fn(10, 10, |_, _| image::Luma([128]));
        let blurred = gaussian_blur(&map, 5);
        for pixel in blurred.pixels() {
            let diff = i16::from(pixel.0[0]) - 128;
            assert!(
                diff.abs() <= 1,
                "expected uniform map to stay near 128 after blur, got {}",
                pixel.0[0],
            );
        }
    }
}
