use geo::{Contains, LineString, Point, Polygon as GeoPolygon};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::float::simplify::SimplifyShape;
use log::warn;

use super::{Bounds, Polygon, Ring};
use crate::error::{MeshError, Result};

/// Points closer than this (per axis) are treated as coincident
const DEDUPE_EPSILON: f64 = 1e-9;

/// Tolerance for matching resolver output back to source vertices
const MATCH_EPSILON: f64 = 1e-7;

/// Reject non-finite coordinates before they reach intersection math
pub fn check_finite(polygon: &Polygon) -> Result<()> {
    for ring in &polygon.rings {
        for p in &ring.points {
            if !p.iter().all(|c| c.is_finite()) {
                return Err(MeshError::unsupported(format!(
                    "non-finite coordinate [{}, {}, {}]",
                    p[0], p[1], p[2]
                )));
            }
        }
    }
    Ok(())
}

/// Drop consecutive coincident points and the closing duplicate
///
/// Returns `None` when fewer than 3 unique points remain; the ring is
/// degenerate and contributes nothing (non-fatal).
pub fn dedupe(ring: &Ring) -> Option<Ring> {
    let mut points: Vec<[f64; 3]> = Vec::with_capacity(ring.points.len());

    for p in &ring.points {
        match points.last() {
            Some(last) if coincident(last, p) => continue,
            _ => points.push(*p),
        }
    }

    // Closing duplicate: last point repeating the first
    if points.len() > 1 && coincident(&points[0], points.last().unwrap()) {
        points.pop();
    }

    if points.len() < 3 {
        warn!(
            "dropping degenerate ring: {} unique points after dedupe",
            points.len()
        );
        return None;
    }

    Some(Ring {
        points,
        has_elevation: ring.has_elevation,
    })
}

fn coincident(a: &[f64; 3], b: &[f64; 3]) -> bool {
    (a[0] - b[0]).abs() < DEDUPE_EPSILON && (a[1] - b[1]).abs() < DEDUPE_EPSILON
}

/// Split a possibly self-intersecting polygon into simple sub-polygons
///
/// The outer contour is run through a planar resolver which yields zero or
/// more simple sub-contours. Each hole is resolved independently and attached
/// to whichever sub-contour contains its first vertex. Coordinates are
/// recentered at the bounding-box midpoint while intersecting (the resolver
/// works on coordinate magnitudes; large offsets cost precision) and shifted
/// back afterwards.
///
/// An empty result means the contour had no interior (zero-area or fully
/// degenerate); callers should skip the polygon.
pub fn split_self_intersecting(polygon: &Polygon) -> Vec<Polygon> {
    let contour = polygon.contour();
    let Some(bounds) = Bounds::from_points(&contour.points) else {
        return Vec::new();
    };
    let (cx, cy) = bounds.center();

    let shifted: Vec<[f64; 2]> = contour
        .points
        .iter()
        .map(|p| [p[0] - cx, p[1] - cy])
        .collect();

    let resolved = shifted.simplify_shape(FillRule::NonZero, 0.0);
    if resolved.is_empty() {
        warn!("self-intersection resolution yielded no contours, skipping polygon");
        return Vec::new();
    }

    let centroid_z = contour.mean_elevation();
    let mut result: Vec<Polygon> = resolved
        .into_iter()
        .map(|shape| {
            let rings = shape
                .into_iter()
                .map(|path| restore_ring(&path, cx, cy, contour, centroid_z))
                .collect();
            Polygon::new(rings)
        })
        .collect();

    // Re-associate every hole with the sub-contour that contains it
    for hole in polygon.holes() {
        let hole_shifted: Vec<[f64; 2]> = hole
            .points
            .iter()
            .map(|p| [p[0] - cx, p[1] - cy])
            .collect();

        let hole_z = hole.mean_elevation();
        for shape in hole_shifted.simplify_shape(FillRule::NonZero, 0.0) {
            // A resolved hole shape's own holes are solid again; only the
            // outer loop subtracts area
            let Some(loop_points) = shape.into_iter().next() else {
                continue;
            };
            let ring = restore_ring(&loop_points, cx, cy, hole, hole_z);
            if let Some(owner) = find_containing(&result, &ring.points[0]) {
                result[owner].rings.push(ring);
            } else {
                warn!("hole lies outside every resolved sub-contour, dropping it");
            }
        }
    }

    result
}

/// Shift a resolver path back to source space, restoring elevation
///
/// Vertices that survive resolution keep their source z; vertices the
/// resolver introduced (intersection points) take the source ring's mean z so
/// dimensionality stays consistent across split results.
fn restore_ring(path: &[[f64; 2]], cx: f64, cy: f64, source: &Ring, fallback_z: f64) -> Ring {
    let points = path
        .iter()
        .map(|p| {
            let x = p[0] + cx;
            let y = p[1] + cy;
            let z = source
                .points
                .iter()
                .find(|sp| (sp[0] - x).abs() < MATCH_EPSILON && (sp[1] - y).abs() < MATCH_EPSILON)
                .map(|sp| sp[2])
                .unwrap_or(fallback_z);
            [x, y, z]
        })
        .collect();

    Ring {
        points,
        has_elevation: source.has_elevation,
    }
}

/// Index of the first polygon whose outer contour contains the point
fn find_containing(candidates: &[Polygon], point: &[f64; 3]) -> Option<usize> {
    let target = Point::new(point[0], point[1]);

    candidates.iter().position(|candidate| {
        let exterior: LineString<f64> = candidate
            .contour()
            .points
            .iter()
            .map(|p| geo::coord! { x: p[0], y: p[1] })
            .collect();
        GeoPolygon::new(exterior, vec![]).contains(&target)
    })
}
