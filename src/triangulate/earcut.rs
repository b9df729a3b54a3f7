use earcutr::earcut;

use crate::polygon::Polygon;

/// Ear-clipping triangulation over contour + holes
///
/// Fast fallback with no curvature model: resample/Steiner points are never
/// consulted. Indices reference the concatenated contour + hole point array.
/// Output winding is reversed to the clockwise convention the constrained
/// path produces, so the mesh assembler treats both strategies identically.
pub fn triangulate_earcut(polygon: &Polygon) -> Vec<usize> {
    let contour = polygon.contour();
    if contour.len() < 3 {
        return Vec::new();
    }

    let total: usize = polygon.rings.iter().map(|r| r.len()).sum();
    let mut vertices: Vec<f64> = Vec::with_capacity(total * 2);
    let mut hole_indices: Vec<usize> = Vec::with_capacity(polygon.holes().len());

    for p in &contour.points {
        vertices.push(p[0]);
        vertices.push(p[1]);
    }

    for hole in polygon.holes() {
        hole_indices.push(vertices.len() / 2);
        for p in &hole.points {
            vertices.push(p[0]);
            vertices.push(p[1]);
        }
    }

    let mut indices = earcut(&vertices, &hole_indices, 2).unwrap_or_default();
    for tri in indices.chunks_mut(3) {
        tri.swap(1, 2);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Ring;

    #[test]
    fn test_square() {
        let polygon = Polygon::new(vec![Ring::from_xy(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
        ])]);
        let indices = triangulate_earcut(&polygon);
        assert_eq!(indices.len(), 6);
    }

    #[test]
    fn test_output_is_clockwise() {
        let polygon = Polygon::new(vec![Ring::from_xy(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
        ])]);
        let points = &polygon.contour().points;
        for t in triangulate_earcut(&polygon).chunks(3) {
            let (a, b, c) = (points[t[0]], points[t[1]], points[t[2]]);
            let signed = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(signed < 0.0);
        }
    }

    #[test]
    fn test_with_hole() {
        let polygon = Polygon::new(vec![
            Ring::from_xy(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            Ring::from_xy(&[(2.0, 2.0), (2.0, 8.0), (8.0, 8.0), (8.0, 2.0)]),
        ]);
        let indices = triangulate_earcut(&polygon);
        assert!(!indices.is_empty());
        assert_eq!(indices.len() % 3, 0);
        assert!(indices.iter().any(|&i| i >= 4));
    }

    #[test]
    fn test_degenerate_contour() {
        let polygon = Polygon::new(vec![Ring::from_xy(&[(0.0, 0.0), (1.0, 1.0)])]);
        assert!(triangulate_earcut(&polygon).is_empty());
    }
}
