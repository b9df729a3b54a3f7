pub mod delaunay;
pub mod earcut;

pub use delaunay::triangulate_constrained;
pub use earcut::triangulate_earcut;

use crate::error::Result;
use crate::polygon::Polygon;

/// A constrained segment as a pair of point-array indices
pub type Edge = [usize; 2];

/// Triangles over one polygon's point set
///
/// `indices` come in groups of 3 and reference `points`, the concatenation of
/// contour points, hole points and any Steiner points used for this
/// triangulation. Triangles are wound clockwise in the xy-plane; the mesh
/// assembler reverses them for the upward-facing cap. `edges` is the
/// constrained boundary/hole segment list, which extrusion walls follow.
#[derive(Debug, Clone)]
pub struct TriangulationResult {
    pub points: Vec<[f64; 3]>,
    pub indices: Vec<usize>,
    pub edges: Vec<Edge>,
}

impl TriangulationResult {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Triangulate a sanitized, winding-normalized polygon
///
/// `steiner` points participate only in the constrained-Delaunay path;
/// ear clipping ignores them.
pub fn triangulate(
    polygon: &Polygon,
    steiner: &[[f64; 3]],
    use_earcut: bool,
) -> Result<TriangulationResult> {
    let mut points: Vec<[f64; 3]> = Vec::new();
    let mut edges: Vec<Edge> = Vec::new();

    for ring in &polygon.rings {
        let offset = points.len();
        let n = ring.len();
        points.extend_from_slice(&ring.points);
        edges.extend((0..n).map(|i| [offset + i, offset + (i + 1) % n]));
    }

    let indices = if use_earcut {
        triangulate_earcut(polygon)
    } else {
        points.extend_from_slice(steiner);
        triangulate_constrained(&points, &edges)?
    };

    Ok(TriangulationResult {
        points,
        indices,
        edges,
    })
}
