use super::{Bounds, Polygon, Ring};

/// Collinearity tolerance for the on-edge Steiner filter
const ON_EDGE_EPSILON: f64 = 1e-9;

/// Guard against cos(latitude) blowing up step sizes at the poles
const MIN_COS_LAT: f64 = 0.01;

/// Densify a polygon's boundary and generate interior Steiner points
///
/// Inserts evenly spaced points along every ring edge and lays a
/// `resolution`-spaced grid across the contour's bounding box. In ellipsoid
/// mode coordinates are (lon, lat) in degrees and east–west distances are
/// compressed by cos(latitude), so point spacing stays roughly uniform once
/// the mesh is projected onto the curved surface.
///
/// Returns the densified polygon plus the interior points; both feed the
/// constrained triangulation (the ear-clipping path has no curvature model
/// and skips resampling entirely).
pub fn resample_polygon(
    polygon: &Polygon,
    resolution: f64,
    ellipsoid_mode: bool,
) -> (Polygon, Vec<[f64; 3]>) {
    let rings = polygon
        .rings
        .iter()
        .map(|ring| densify_ring(ring, resolution, ellipsoid_mode))
        .collect();
    let densified = Polygon::new(rings);

    let steiner = interior_grid(&densified, resolution, ellipsoid_mode);
    (densified, steiner)
}

/// Insert intermediate points so no edge is longer than `resolution`
fn densify_ring(ring: &Ring, resolution: f64, ellipsoid_mode: bool) -> Ring {
    let n = ring.points.len();
    let mut points = Vec::with_capacity(n * 2);

    for i in 0..n {
        let p = ring.points[i];
        let q = ring.points[(i + 1) % n];
        points.push(p);

        let dx = q[0] - p[0];
        let dy = q[1] - p[1];
        let dx_eff = if ellipsoid_mode {
            let mid_lat = ((p[1] + q[1]) / 2.0).to_radians();
            dx * mid_lat.cos().abs().max(MIN_COS_LAT)
        } else {
            dx
        };
        let length = (dx_eff * dx_eff + dy * dy).sqrt();

        let segments = (length / resolution).ceil() as usize;
        for s in 1..segments {
            let t = s as f64 / segments as f64;
            points.push([p[0] + dx * t, p[1] + dy * t, p[2] + (q[2] - p[2]) * t]);
        }
    }

    Ring {
        points,
        has_elevation: ring.has_elevation,
    }
}

/// Grid of interior candidate points over the contour bounding box
///
/// A grid point is dropped only when it lies exactly on a boundary or hole
/// segment, where it would break constrained-edge recovery; everything else
/// is kept, since triangle selection later discards exterior triangles
/// anyway.
fn interior_grid(polygon: &Polygon, resolution: f64, ellipsoid_mode: bool) -> Vec<[f64; 3]> {
    let contour = polygon.contour();
    let Some(bounds) = Bounds::from_points(&contour.points) else {
        return Vec::new();
    };

    let z = contour.mean_elevation();
    let mut points = Vec::new();

    let mut y = bounds.min_y + resolution;
    while y < bounds.max_y {
        let x_step = if ellipsoid_mode {
            resolution / y.to_radians().cos().abs().max(MIN_COS_LAT)
        } else {
            resolution
        };

        let mut x = bounds.min_x + x_step;
        while x < bounds.max_x {
            if !on_any_edge(polygon, x, y) {
                points.push([x, y, z]);
            }
            x += x_step;
        }
        y += resolution;
    }

    points
}

fn on_any_edge(polygon: &Polygon, x: f64, y: f64) -> bool {
    polygon.rings.iter().any(|ring| {
        let n = ring.points.len();
        (0..n).any(|i| {
            let p = ring.points[i];
            let q = ring.points[(i + 1) % n];
            on_segment(&p, &q, x, y)
        })
    })
}

/// Collinearity plus segment-bounds containment
fn on_segment(p: &[f64; 3], q: &[f64; 3], x: f64, y: f64) -> bool {
    if x < p[0].min(q[0]) - ON_EDGE_EPSILON || x > p[0].max(q[0]) + ON_EDGE_EPSILON {
        return false;
    }
    if y < p[1].min(q[1]) - ON_EDGE_EPSILON || y > p[1].max(q[1]) + ON_EDGE_EPSILON {
        return false;
    }

    let cross = (q[0] - p[0]) * (y - p[1]) - (q[1] - p[1]) * (x - p[0]);
    cross.abs() < ON_EDGE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Polygon {
        Polygon::new(vec![Ring::from_xy(&[
            (0.0, 0.0),
            (size, 0.0),
            (size, size),
            (0.0, size),
        ])])
    }

    #[test]
    fn test_densify_edge_lengths() {
        let (resampled, _) = resample_polygon(&square(4.0), 1.0, false);
        let ring = resampled.contour();

        // Each 4-unit edge splits into 4 segments: 16 boundary points total
        assert_eq!(ring.len(), 16);

        let n = ring.len();
        for i in 0..n {
            let p = ring.points[i];
            let q = ring.points[(i + 1) % n];
            let len = ((q[0] - p[0]).powi(2) + (q[1] - p[1]).powi(2)).sqrt();
            assert!(len <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_densify_interpolates_elevation() {
        let ring = Ring::from_xyz(&[(0.0, 0.0, 0.0), (4.0, 0.0, 4.0), (0.0, 4.0, 0.0)]);
        let dense = densify_ring(&ring, 1.0, false);

        // Midpoint of the first edge carries the interpolated z
        let mid = dense
            .points
            .iter()
            .find(|p| p[0] == 2.0 && p[1] == 0.0)
            .unwrap();
        assert_eq!(mid[2], 2.0);
    }

    #[test]
    fn test_interior_grid_spacing() {
        let (_, steiner) = resample_polygon(&square(4.0), 1.0, false);

        // 3x3 interior lattice, none on the boundary
        assert_eq!(steiner.len(), 9);
        for p in &steiner {
            assert!(p[0] > 0.0 && p[0] < 4.0);
            assert!(p[1] > 0.0 && p[1] < 4.0);
        }
    }

    #[test]
    fn test_grid_skips_points_on_hole_edges() {
        let mut polygon = square(4.0);
        // Hole edge passing through the would-be grid point (2, 2)
        polygon.rings.push(Ring::from_xy(&[
            (1.0, 2.0),
            (3.0, 2.0),
            (3.0, 2.5),
            (1.0, 2.5),
        ]));
        let steiner = interior_grid(&polygon, 1.0, false);
        assert!(!steiner.iter().any(|p| p[0] == 2.0 && p[1] == 2.0));
    }

    #[test]
    fn test_ellipsoid_mode_compresses_east_west() {
        // At 60°N cos(lat) = 0.5: east-west grid strides double
        let polygon = Polygon::new(vec![Ring::from_xy(&[
            (0.0, 60.0),
            (4.0, 60.0),
            (4.0, 64.0),
            (0.0, 64.0),
        ])]);
        let (_, flat_grid) = resample_polygon(&polygon, 1.0, false);
        let (_, globe_grid) = resample_polygon(&polygon, 1.0, true);
        assert!(globe_grid.len() < flat_grid.len());
    }
}
