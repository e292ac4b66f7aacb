//! Contour-polygon region location.
//!
//! Works on the binary edge mask rather than the raw magnitudes:
//!
//! 1. Trace the outer boundary of every connected edge component
//!    (Suzuki-Abe border following, 8-connectivity).
//! 2. Keep boundaries whose enclosed area lies between `min_area_ratio`
//!    and `max_area_ratio` of the image.
//! 3. Approximate each boundary with a polygon, tolerance
//!    `polygon_approx_epsilon * perimeter`.
//! 4. Strict pass: convex quadrilaterals whose bounding rectangle has a
//!    strip-like aspect ratio. The largest wins.
//! 5. Lenient pass, only when the strict pass found nothing: the largest
//!    boundary whose bounding rectangle falls in the wider bands.
//!
//! Unlike the density strategy this one can come back empty-handed.

use std::cmp::Ordering;

use tracing::debug;

use crate::edge::edge_mask;
use crate::polygon::{approximate_closed, area, bounding_rect, is_convex, perimeter};
use crate::types::{
    CropConfig, CropError, DetectionMethod, DetectionResult, Dimensions, EdgeMap, GrayImage, Point,
    Rect,
};

/// A traced boundary that survived the area filter.
#[derive(Debug, Clone)]
struct Candidate {
    area: f64,
    polygon: Vec<Point>,
    bounds: Rect,
}

/// Trace the outermost boundary of every foreground component in a
/// binary mask.
///
/// Boundaries of holes, and of components nested inside holes, are
/// skipped. Any non-zero pixel counts as foreground. Boundaries with
/// fewer than 3 points enclose no area and are dropped.
#[must_use]
pub fn trace_outer(mask: &GrayImage) -> Vec<Vec<Point>> {
    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(mask);

    contours
        .into_iter()
        .filter(|c| {
            c.border_type == imageproc::contours::BorderType::Outer
                && c.parent.is_none()
                && c.points.len() >= 3
        })
        .map(|c| {
            c.points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect()
        })
        .collect()
}

fn by_area(a: &Candidate, b: &Candidate) -> Ordering {
    a.area.total_cmp(&b.area)
}

/// Locate the strip by filtering traced boundaries.
///
/// Returns an unsuccessful [`DetectionResult`] when neither pass finds a
/// strip-like boundary; the pipeline turns that into
/// [`CropError::NoRegionFound`].
///
/// # Errors
///
/// Returns [`CropError::ProcessingFailed`] if the chosen rectangle cannot
/// be clamped into the image.
pub fn locate_contour(
    edges: &EdgeMap,
    dimensions: Dimensions,
    config: &CropConfig,
) -> Result<DetectionResult, CropError> {
    let mask = edge_mask(edges, config.mask_threshold, config.close_radius);
    let boundaries = trace_outer(&mask);

    let image_area = f64::from(dimensions.width) * f64::from(dimensions.height);
    let min_area = config.min_area_ratio * image_area;
    let max_area = config.max_area_ratio * image_area;

    let mut candidates: Vec<Candidate> = boundaries
        .iter()
        .filter_map(|ring| {
            let enclosed = area(ring);
            if enclosed < min_area || enclosed > max_area {
                return None;
            }
            let polygon =
                approximate_closed(ring, config.polygon_approx_epsilon * perimeter(ring));
            Some(Candidate {
                area: enclosed,
                polygon,
                bounds: bounding_rect(ring)?,
            })
        })
        .collect();
    debug!(
        traced = boundaries.len(),
        kept = candidates.len(),
        min_area,
        max_area,
        "contour candidates"
    );

    let strict = candidates
        .iter()
        .filter(|c| {
            c.polygon.len() == 4
                && is_convex(&c.polygon)
                && config.strict_bands.accepts(c.bounds.aspect_ratio())
        })
        .max_by(|a, b| by_area(a, b))
        .map(|c| c.bounds);

    let (chosen, method) = if let Some(bounds) = strict {
        (bounds, DetectionMethod::ContourStrict)
    } else {
        candidates.sort_by(|a, b| by_area(b, a));
        let Some(c) = candidates
            .iter()
            .find(|c| config.lenient_bands.accepts(c.bounds.aspect_ratio()))
        else {
            return Ok(DetectionResult::not_found(format!(
                "none of {} traced boundaries ({} within the area limits) has a strip-like shape",
                boundaries.len(),
                candidates.len(),
            )));
        };
        (c.bounds, DetectionMethod::ContourLenient)
    };

    let rect = chosen.clamp_to(dimensions).ok_or_else(|| {
        CropError::ProcessingFailed(format!("contour bounds {chosen} lie outside {dimensions}"))
    })?;
    debug!(%rect, %method, "contour match");

    let message = match method {
        DetectionMethod::ContourStrict => "strip outline found as a convex quadrilateral",
        _ => "no quadrilateral outline; used the largest strip-shaped boundary",
    };
    Ok(DetectionResult::found(rect, method, message))
}
