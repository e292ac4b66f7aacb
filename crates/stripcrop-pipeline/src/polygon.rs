//! Closed-polygon geometry for contour filtering.
//!
//! A traced boundary is a closed ring of pixel positions, often hundreds
//! of points long. [`approximate_closed`] reduces it to the few vertices
//! that describe its shape with a Ramer-Douglas-Peucker pass adapted to
//! rings: the ring is split at its first point and the point farthest
//! from it, each half is simplified as an open polyline, and vertices
//! left lying on the line through their neighbors are dropped. A
//! rectangular outline comes out as exactly four corners.
//!
//! The remaining functions measure the result: [`area`] (shoelace),
//! [`perimeter`], [`is_convex`] and [`bounding_rect`].

use crate::types::{Point, Rect};

/// Approximate a closed ring of points with fewer vertices.
///
/// No point of the input lies farther than `epsilon` from the returned
/// polygon's outline. The ring is implicitly closed (the last point
/// connects back to the first); the output is closed the same way.
/// Rings with fewer than 4 points are returned unchanged.
#[must_use = "returns the approximated polygon"]
pub fn approximate_closed(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n < 4 {
        return points.to_vec();
    }

    let first = points[0];
    let far = (1..n)
        .max_by(|&a, &b| {
            first
                .distance_squared(points[a])
                .total_cmp(&first.distance_squared(points[b]))
        })
        .unwrap_or(n / 2);

    // Repeat the first point at the end so the second half is an
    // ordinary open polyline ending where the ring started.
    let mut ring = points.to_vec();
    ring.push(first);

    let mut kept = vec![false; n + 1];
    kept[0] = true;
    kept[far] = true;
    kept[n] = true;
    rdp_recurse(&ring, 0, far, epsilon, &mut kept);
    rdp_recurse(&ring, far, n, epsilon, &mut kept);

    let mut simplified: Vec<Point> = ring[..n]
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();

    drop_collinear(&mut simplified, epsilon);
    simplified
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// line segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-segments are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Remove vertices within `tolerance` of the line through their two
/// neighbors, treating the polygon as a ring. Never reduces below a
/// triangle.
///
/// The split points chosen by [`approximate_closed`] are not necessarily
/// corners; a split point in the middle of a straight side is removed
/// here.
fn drop_collinear(polygon: &mut Vec<Point>, tolerance: f64) {
    while polygon.len() > 3 {
        let n = polygon.len();
        let redundant = (0..n).find(|&i| {
            let prev = polygon[(i + n - 1) % n];
            let next = polygon[(i + 1) % n];
            perpendicular_distance(polygon[i], prev, next) <= tolerance
        });
        match redundant {
            Some(i) => {
                polygon.remove(i);
            }
            None => break,
        }
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

/// Area enclosed by a closed ring (shoelace formula), always
/// non-negative regardless of winding.
#[must_use]
pub fn area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = edges(points)
        .map(|(a, b)| a.x.mul_add(b.y, -(b.x * a.y)))
        .sum();
    twice.abs() / 2.0
}

/// Length of a closed ring's outline, including the closing segment.
#[must_use]
pub fn perimeter(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    edges(points).map(|(a, b)| a.distance(b)).sum()
}

/// Whether the polygon is convex: every turn goes the same way.
///
/// Collinear vertices are tolerated. Polygons with fewer than 3
/// vertices, or with no turns at all, are not convex.
#[must_use]
pub fn is_convex(polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut sign = 0.0_f64;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let c = polygon[(i + 2) % n];
        let cross = (b.x - a.x).mul_add(c.y - b.y, -((b.y - a.y) * (c.x - b.x)));
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Smallest axis-aligned pixel rectangle containing every point.
///
/// Coordinates are treated as pixel indices: a ring touching columns 3
/// and 7 has width 5. Negative coordinates are clamped to 0. Returns
/// `None` for an empty slice or non-finite coordinates.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn bounding_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
        return None;
    }

    let pixel = |v: f64| v.clamp(0.0, f64::from(u32::MAX)) as u32;
    Some(Rect::from_bounds(
        pixel(min_x.floor()),
        pixel(min_y.floor()),
        pixel(max_x.ceil()),
        pixel(max_y.ceil()),
    ))
}

/// Consecutive vertex pairs of a closed ring, including last-to-first.
fn edges(points: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(&a, &b)| (a, b))
}
