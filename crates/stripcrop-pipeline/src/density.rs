//! Density-profile region location.
//!
//! A test strip photographed against a plain background shows up in the
//! edge map as two long vertical boundaries. Counting, per column, the
//! fraction of pixels whose magnitude exceeds the edge threshold gives a
//! profile with two tall spikes at the strip's left and right sides. The
//! first and last columns above the continuity threshold bound the strip
//! horizontally; the same scan over rows, restricted to those columns,
//! bounds it vertically.
//!
//! This strategy never fails. When no column qualifies, or the detected
//! span is narrower than `min_strip_width_ratio` of the image, it returns
//! the horizontally centered half-width slice tagged
//! [`DetectionMethod::DensityFallback`].

use tracing::{debug, warn};

use crate::types::{CropConfig, CropError, DetectionMethod, DetectionResult, Dimensions, EdgeMap, Rect};

/// Fraction of each column's pixels whose magnitude exceeds `threshold`.
///
/// Returns one entry per column.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn column_density(edges: &EdgeMap, threshold: u8) -> Vec<f64> {
    let (width, height) = edges.dimensions();
    if width == 0 || height == 0 {
        return vec![0.0; width as usize];
    }
    let mut counts = vec![0u32; width as usize];
    for row in edges.as_raw().chunks_exact(width as usize) {
        for (count, &v) in counts.iter_mut().zip(row) {
            *count += u32::from(v > threshold);
        }
    }
    let height = f64::from(height);
    counts.into_iter().map(|c| f64::from(c) / height).collect()
}

/// Fraction of each row's pixels in columns `left..=right` whose
/// magnitude exceeds `threshold`.
///
/// Returns one entry per row. The column range is clipped to the map;
/// an empty range yields an all-zero profile.
#[must_use]
pub fn row_density(edges: &EdgeMap, threshold: u8, left: u32, right: u32) -> Vec<f64> {
    let (width, height) = edges.dimensions();
    let right = right.min(width.saturating_sub(1));
    if width == 0 || left > right {
        return vec![0.0; height as usize];
    }
    let span = f64::from(right - left + 1);
    edges
        .as_raw()
        .chunks_exact(width as usize)
        .map(|row| {
            let count: u32 = row[left as usize..=right as usize]
                .iter()
                .map(|&v| u32::from(v > threshold))
                .sum();
            f64::from(count) / span
        })
        .collect()
}

/// First and last indices whose density strictly exceeds `min_density`.
fn span_above(profile: &[f64], min_density: f64) -> Option<(usize, usize)> {
    let first = profile.iter().position(|&d| d > min_density)?;
    let last = profile.iter().rposition(|&d| d > min_density)?;
    Some((first, last))
}

/// Horizontally centered half-width slice: `center ± width / 4`.
const fn centered_slice(width: u32) -> (u32, u32) {
    let center = width / 2;
    let quarter = width / 4;
    let right = center + quarter;
    let last = width.saturating_sub(1);
    (center - quarter, if right < last { right } else { last })
}

fn to_u32(index: usize) -> Result<u32, CropError> {
    u32::try_from(index)
        .map_err(|_| CropError::ProcessingFailed(format!("profile index {index} overflows u32")))
}

/// Locate the strip from column and row edge-density profiles.
///
/// Always returns a successful [`DetectionResult`] whose rectangle lies
/// inside `dimensions`.
///
/// # Errors
///
/// Returns [`CropError::ProcessingFailed`] if a profile index does not
/// fit in `u32` or the rectangle cannot be clamped into the image (only
/// possible for an empty image, which earlier stages reject).
pub fn locate_density(
    edges: &EdgeMap,
    dimensions: Dimensions,
    config: &CropConfig,
) -> Result<DetectionResult, CropError> {
    let columns = column_density(edges, config.edge_threshold);
    let min_width = config.min_strip_width_ratio * f64::from(dimensions.width);

    let (left, right, fallback_reason) =
        match span_above(&columns, config.min_vertical_continuity) {
            Some((first, last)) => {
                let (left, right) = (to_u32(first)?, to_u32(last)?);
                debug!(left, right, "column density bounds");
                if f64::from(right - left) < min_width {
                    let (l, r) = centered_slice(dimensions.width);
                    (
                        l,
                        r,
                        Some(format!(
                            "detected span {left}..={right} is narrower than {min_width:.1} px"
                        )),
                    )
                } else {
                    (left, right, None)
                }
            }
            None => {
                let (l, r) = centered_slice(dimensions.width);
                (
                    l,
                    r,
                    Some(format!(
                        "no column exceeds continuity {}",
                        config.min_vertical_continuity
                    )),
                )
            }
        };

    if let Some(reason) = &fallback_reason {
        warn!(left, right, %reason, "falling back to centered slice");
    }

    let rows = row_density(edges, config.edge_threshold, left, right);
    let (top, bottom) = match span_above(&rows, config.min_vertical_continuity) {
        Some((first, last)) => (to_u32(first)?, to_u32(last)?),
        None => (0, dimensions.height.saturating_sub(1)),
    };
    debug!(top, bottom, "row density bounds");

    let rect = Rect::from_bounds(left, top, right, bottom)
        .clamp_to(dimensions)
        .ok_or_else(|| {
            CropError::ProcessingFailed(format!(
                "density bounds ({left}, {top})..=({right}, {bottom}) lie outside {dimensions}"
            ))
        })?;

    Ok(match fallback_reason {
        Some(reason) => DetectionResult::found(
            rect,
            DetectionMethod::DensityFallback,
            format!("low confidence, used centered slice: {reason}"),
        ),
        None => DetectionResult::found(
            rect,
            DetectionMethod::DensityProfile,
            "strip bounds found from edge density profiles",
        ),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Luma;

    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    /// Edge map with full-strength vertical lines at the given columns,
    /// spanning rows `top..=bottom`, and horizontal lines at `top` and
    /// `bottom` between them.
    fn outline(width: u32, height: u32, left: u32, right: u32, top: u32, bottom: u32) -> EdgeMap {
        EdgeMap::from_fn(width, height, |x, y| {
            let on_side = (x == left || x == right) && (top..=bottom).contains(&y);
            let on_cap = (y == top || y == bottom) && (left..=right).contains(&x);
            Luma([if on_side || on_cap { 255 } else { 0 }])
        })
    }

    #[test]
    fn column_density_counts_strictly_above_threshold() {
        let mut edges = EdgeMap::new(2, 4);
        edges.put_pixel(0, 0, Luma([31]));
        edges.put_pixel(0, 1, Luma([30]));
        edges.put_pixel(1, 2, Luma([200]));
        edges.put_pixel(1, 3, Luma([200]));
        let profile = column_density(&edges, 30);
        assert_eq!(profile, vec![0.25, 0.5]);
    }

    #[test]
    fn row_density_uses_column_range() {
        let mut edges = EdgeMap::new(10, 2);
        for x in 0..10 {
            edges.put_pixel(x, 0, Luma([255]));
        }
        edges.put_pixel(0, 1, Luma([255]));
        let profile = row_density(&edges, 0, 2, 5);
        assert_eq!(profile, vec![1.0, 0.0]);
    }

    #[test]
    fn row_density_with_inverted_range_is_zero() {
        let edges = EdgeMap::from_pixel(4, 3, Luma([255]));
        assert_eq!(row_density(&edges, 0, 3, 1), vec![0.0; 3]);
    }

    #[test]
    fn centered_slice_is_half_width() {
        assert_eq!(centered_slice(400), (100, 300));
        assert_eq!(centered_slice(3), (1, 1));
        assert_eq!(centered_slice(5), (1, 3));
    }

    #[test]
    fn outlined_strip_is_recovered() {
        let edges = outline(200, 300, 60, 100, 20, 280);
        let result = locate_density(&edges, dims(200, 300), &CropConfig::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.method, DetectionMethod::DensityProfile);
        assert_eq!(result.rect, Some(Rect::from_bounds(60, 20, 100, 280)));
    }

    #[test]
    fn blank_map_falls_back_to_centered_slice() {
        let edges = EdgeMap::new(400, 800);
        let result = locate_density(&edges, dims(400, 800), &CropConfig::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.method, DetectionMethod::DensityFallback);
        assert_eq!(result.rect, Some(Rect::from_bounds(100, 0, 300, 799)));
    }

    #[test]
    fn narrow_span_falls_back() {
        // Two lines 4 px apart in a 200 px image; minimum width is 10 px.
        let edges = outline(200, 100, 50, 54, 0, 99);
        let result = locate_density(&edges, dims(200, 100), &CropConfig::default()).unwrap();
        assert_eq!(result.method, DetectionMethod::DensityFallback);
        let rect = result.rect.unwrap();
        assert_eq!((rect.x, rect.width), (50, 101));
    }

    #[test]
    fn minimum_size_image_is_handled() {
        let edges = EdgeMap::new(3, 3);
        let result = locate_density(&edges, dims(3, 3), &CropConfig::default()).unwrap();
        let rect = result.rect.unwrap();
        assert!(rect.fits_within(dims(3, 3)));
    }

    #[test]
    fn result_always_fits_image() {
        for (w, h) in [(3, 50), (50, 3), (7, 7), (101, 33)] {
            let edges = EdgeMap::from_fn(w, h, |x, y| Luma([if (x * 7 + y * 3) % 5 == 0 { 255 } else { 0 }]));
            let result = locate_density(&edges, dims(w, h), &CropConfig::default()).unwrap();
            assert!(result.success);
            assert!(
                result.rect.unwrap().fits_within(dims(w, h)),
                "rect {:?} escapes {w}x{h}",
                result.rect,
            );
        }
    }
}
