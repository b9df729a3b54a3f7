use geo::{Area, LineString, Polygon as GeoPolygon};

use super::{Polygon, Ring};

/// Signed 2D area of a ring (shoelace): positive for counter-clockwise
pub fn signed_area(ring: &Ring) -> f64 {
    let exterior: LineString<f64> = ring
        .points
        .iter()
        .map(|p| geo::coord! { x: p[0], y: p[1] })
        .collect();

    GeoPolygon::new(exterior, vec![]).signed_area()
}

/// Enforce the orientation the rest of the pipeline assumes:
/// outer contour counter-clockwise, holes clockwise
///
/// Triangulation constraint directions and extrusion-wall winding both rely
/// on this; upstream data does not reliably comply.
pub fn correct_winding(polygon: &Polygon) -> Polygon {
    let rings = polygon
        .rings
        .iter()
        .enumerate()
        .map(|(i, ring)| {
            let area = signed_area(ring);
            let is_hole = i > 0;
            let needs_reverse = if is_hole { area > 0.0 } else { area < 0.0 };

            if needs_reverse {
                let mut points = ring.points.clone();
                points.reverse();
                Ring {
                    points,
                    has_elevation: ring.has_elevation,
                }
            } else {
                ring.clone()
            }
        })
        .collect();

    Polygon::new(rings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_ccw() -> Ring {
        Ring::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)])
    }

    fn square_cw() -> Ring {
        Ring::from_xy(&[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0)])
    }

    #[test]
    fn test_signed_area_sign() {
        assert_eq!(signed_area(&square_ccw()), 16.0);
        assert_eq!(signed_area(&square_cw()), -16.0);
    }

    #[test]
    fn test_correct_winding_fixes_both_rings() {
        // Contour given CW, hole given CCW: both wrong
        let hole = Ring::from_xy(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        let polygon = Polygon::new(vec![square_cw(), hole]);

        let fixed = correct_winding(&polygon);
        assert!(signed_area(fixed.contour()) > 0.0);
        assert!(signed_area(&fixed.holes()[0]) < 0.0);
    }

    #[test]
    fn test_correct_winding_idempotent() {
        let hole = Ring::from_xy(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        let polygon = Polygon::new(vec![square_cw(), hole]);

        let once = correct_winding(&polygon);
        let twice = correct_winding(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_correct_winding_preserves_elevation() {
        let ring = Ring::from_xyz(&[(0.0, 0.0, 1.0), (0.0, 4.0, 2.0), (4.0, 4.0, 3.0)]);
        let fixed = correct_winding(&Polygon::new(vec![ring]));
        assert!(fixed.contour().has_elevation);
        assert_eq!(fixed.contour().points[0][2], 3.0);
    }
}
