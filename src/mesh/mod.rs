pub mod assemble;
pub mod ellipsoid;
pub mod validation;

pub use ellipsoid::{Ellipsoid, EllipsoidAdapter};
pub use validation::{ValidationResult, validate_buffers};

use log::{debug, warn};

use crate::error::{MeshError, Result};
use crate::polygon::{
    Polygon, check_finite, correct_winding, dedupe, resample_polygon, split_self_intersecting,
};
use crate::triangulate::{TriangulationResult, triangulate};

/// Options for the polygon-to-mesh pipeline
#[derive(Debug, Clone)]
pub struct MeshOptions {
    /// Extrusion height; 0 produces a top cap only
    pub thickness: f64,
    /// Base elevation added under every vertex
    pub offset: f64,
    /// Ignore per-vertex elevation from the input
    pub flat: bool,
    /// Target spacing for boundary/interior resampling (constrained
    /// triangulation only)
    pub resolution: Option<f64>,
    /// Split self-intersecting contours before triangulating
    pub detect_self_intersection: bool,
    /// Multiplier applied to per-vertex elevation
    pub altitude_scale: f64,
    /// Ear-clipping strategy instead of constrained Delaunay
    pub use_earcut: bool,
    /// How many consecutive source polygons share each material
    pub groups: Option<Vec<usize>>,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            thickness: 0.0,
            offset: 0.0,
            flat: false,
            resolution: None,
            detect_self_intersection: true,
            altitude_scale: 1.0,
            use_earcut: false,
            groups: None,
        }
    }
}

/// A contiguous vertex range rendered with one material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialGroup {
    pub offset: usize,
    pub count: usize,
    pub material_index: usize,
}

/// Render-ready mesh: flat f32 position/normal buffers plus material ranges
///
/// Positions are re-centered at the mesh bounding-box midpoint; `center`
/// holds the subtracted midpoint so the renderer can place the mesh in the
/// world.
#[derive(Debug, Clone, Default)]
pub struct MeshBuffers {
    /// 3 floats per vertex
    pub positions: Vec<f32>,
    /// 3 floats per vertex, unit length
    pub normals: Vec<f32>,
    pub groups: Vec<MaterialGroup>,
    pub center: [f64; 3],
}

impl MeshBuffers {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Run sanitize → winding → resample → triangulate for one polygon
///
/// Returns one triangulation per simple sub-polygon (self-intersecting input
/// splits into several). An empty vector means the polygon degenerated to
/// nothing; an error means this polygon cannot be meshed. Neither outcome
/// affects other polygons in a batch.
pub fn triangulate_polygon(
    polygon: &Polygon,
    options: &MeshOptions,
    ellipsoid_mode: bool,
) -> Result<Vec<TriangulationResult>> {
    if polygon.rings.is_empty() {
        return Err(MeshError::malformed("polygon has no rings"));
    }
    check_finite(polygon)?;

    let mut rings = Vec::new();
    for (i, ring) in polygon.rings.iter().enumerate() {
        match dedupe(ring) {
            Some(clean) => rings.push(clean),
            // Degenerate contour: the polygon contributes nothing
            None if i == 0 => return Ok(Vec::new()),
            // Degenerate hole: drop it, keep the polygon
            None => {}
        }
    }
    let cleaned = Polygon::new(rings);

    let parts = if options.detect_self_intersection {
        split_self_intersecting(&cleaned)
    } else {
        vec![cleaned]
    };

    let mut results = Vec::with_capacity(parts.len());
    for part in &parts {
        let oriented = correct_winding(part);

        let (ready, steiner) = match options.resolution {
            Some(resolution) if !options.use_earcut => {
                resample_polygon(&oriented, resolution, ellipsoid_mode)
            }
            _ => (oriented, Vec::new()),
        };

        results.push(triangulate(&ready, &steiner, options.use_earcut)?);
    }
    Ok(results)
}

/// Full pipeline over a batch of polygons
///
/// A polygon that fails to mesh is logged and skipped; the rest of the batch
/// still assembles, so one malformed shape never blanks a whole scene.
pub fn polygons_to_mesh(
    polygons: &[Polygon],
    options: &MeshOptions,
    ellipsoid: Option<&dyn EllipsoidAdapter>,
) -> MeshBuffers {
    let mut per_polygon: Vec<Vec<TriangulationResult>> = Vec::with_capacity(polygons.len());

    for (i, polygon) in polygons.iter().enumerate() {
        match triangulate_polygon(polygon, options, ellipsoid.is_some()) {
            Ok(results) => per_polygon.push(results),
            Err(err) => {
                warn!("skipping polygon {i}: {err}");
                // Keep the slot so material groups stay aligned
                per_polygon.push(Vec::new());
            }
        }
    }

    let buffers = assemble::assemble(&per_polygon, options, ellipsoid);
    debug!(
        "assembled {} vertices in {} groups from {} polygons",
        buffers.vertex_count(),
        buffers.groups.len(),
        polygons.len()
    );
    buffers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Ring;

    fn quad() -> Polygon {
        Polygon::new(vec![Ring::from_xy(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
        ])])
    }

    fn square_with_hole() -> Polygon {
        Polygon::new(vec![
            Ring::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
            Ring::from_xy(&[(0.25, 0.25), (0.25, 0.75), (0.75, 0.75), (0.75, 0.25)]),
        ])
    }

    /// Sum of xy-plane triangle areas over consecutive vertex triples
    fn cap_area(buffers: &MeshBuffers, vertices: usize) -> f64 {
        (0..vertices / 3)
            .map(|t| {
                let v = |k: usize| {
                    let i = (t * 3 + k) * 3;
                    (buffers.positions[i] as f64, buffers.positions[i + 1] as f64)
                };
                let (ax, ay) = v(0);
                let (bx, by) = v(1);
                let (cx, cy) = v(2);
                ((bx - ax) * (cy - ay) - (by - ay) * (cx - ax)).abs() / 2.0
            })
            .sum()
    }

    #[test]
    fn test_quad_flat_mesh() {
        let buffers = polygons_to_mesh(&[quad()], &MeshOptions::default(), None);

        // 2 triangles, no extrusion: exactly the triangle-index count
        assert_eq!(buffers.vertex_count(), 6);
        assert!((cap_area(&buffers, 6) - 16.0).abs() < 1e-6);
        assert_eq!(buffers.center, [2.0, 2.0, 0.0]);
    }

    #[test]
    fn test_top_cap_faces_up() {
        let buffers = polygons_to_mesh(&[quad()], &MeshOptions::default(), None);
        for v in 0..buffers.vertex_count() {
            assert_eq!(buffers.normals[v * 3 + 2], 1.0);
        }
    }

    #[test]
    fn test_extruded_vertex_count() {
        let options = MeshOptions {
            thickness: 2.0,
            ..MeshOptions::default()
        };
        let buffers = polygons_to_mesh(&[square_with_hole()], &options, None);

        // 8 cap triangles = 24 cap vertices, 8 constrained edges:
        // 2 * 24 + 6 * 8 = 96
        assert_eq!(buffers.vertex_count(), 96);
    }

    #[test]
    fn test_hole_area_excluded() {
        let buffers = polygons_to_mesh(&[square_with_hole()], &MeshOptions::default(), None);
        assert_eq!(buffers.vertex_count(), 24);
        assert!((cap_area(&buffers, 24) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_bowtie_meshes_instead_of_failing() {
        let bowtie = Polygon::new(vec![Ring::from_xy(&[
            (0.0, 0.0),
            (4.0, 4.0),
            (4.0, 0.0),
            (0.0, 4.0),
        ])]);
        let buffers = polygons_to_mesh(&[bowtie], &MeshOptions::default(), None);

        // Two triangular lobes of area 4 each
        assert_eq!(buffers.vertex_count(), 6);
        assert!((cap_area(&buffers, 6) - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_extrusion_offsets_both_caps() {
        let options = MeshOptions {
            thickness: 2.0,
            offset: 10.0,
            ..MeshOptions::default()
        };
        let buffers = polygons_to_mesh(&[quad()], &options, None);

        // Centered z spans [-1, 1]; center carries the absolute elevation
        assert_eq!(buffers.center[2], 11.0);
        let zs: Vec<f32> = (0..buffers.vertex_count())
            .map(|v| buffers.positions[v * 3 + 2])
            .collect();
        assert!(zs.iter().all(|&z| z == 1.0 || z == -1.0));
    }

    #[test]
    fn test_flat_ignores_elevation() {
        let ring = Ring::from_xyz(&[
            (0.0, 0.0, 3.0),
            (4.0, 0.0, 5.0),
            (4.0, 4.0, 7.0),
            (0.0, 4.0, 9.0),
        ]);
        let options = MeshOptions {
            flat: true,
            ..MeshOptions::default()
        };
        let buffers = polygons_to_mesh(&[Polygon::new(vec![ring])], &options, None);

        for v in 0..buffers.vertex_count() {
            assert_eq!(buffers.positions[v * 3 + 2], 0.0);
        }
    }

    #[test]
    fn test_altitude_scale() {
        let ring = Ring::from_xyz(&[
            (0.0, 0.0, 2.0),
            (4.0, 0.0, 2.0),
            (4.0, 4.0, 2.0),
            (0.0, 4.0, 2.0),
        ]);
        let options = MeshOptions {
            altitude_scale: 3.0,
            ..MeshOptions::default()
        };
        let buffers = polygons_to_mesh(&[Polygon::new(vec![ring])], &options, None);
        assert_eq!(buffers.center[2], 6.0);
    }

    #[test]
    fn test_default_groups_when_extruded() {
        let options = MeshOptions {
            thickness: 1.0,
            ..MeshOptions::default()
        };
        let buffers = polygons_to_mesh(&[quad()], &options, None);

        // Default top / bottom / sides ranges
        assert_eq!(buffers.groups.len(), 3);
        assert_eq!(buffers.groups[0].count, 6);
        assert_eq!(buffers.groups[1].count, 6);
        assert_eq!(buffers.groups[2].count, 24);
        assert_eq!(buffers.groups[2].offset, 12);
        let indices: Vec<usize> = buffers.groups.iter().map(|g| g.material_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_per_material_groups() {
        let far_quad = Polygon::new(vec![Ring::from_xy(&[
            (10.0, 0.0),
            (14.0, 0.0),
            (14.0, 4.0),
            (10.0, 4.0),
        ])]);
        let options = MeshOptions {
            thickness: 1.0,
            groups: Some(vec![1, 1]),
            ..MeshOptions::default()
        };
        let buffers = polygons_to_mesh(&[quad(), far_quad], &options, None);

        // Two materials per layer, three layers
        assert_eq!(buffers.groups.len(), 6);
        let total: usize = buffers.groups.iter().map(|g| g.count).sum();
        assert_eq!(total, buffers.vertex_count());

        // Ranges tile the buffer contiguously
        let mut expected_offset = 0;
        for (i, group) in buffers.groups.iter().enumerate() {
            assert_eq!(group.offset, expected_offset);
            assert_eq!(group.material_index, i);
            expected_offset += group.count;
        }
    }

    #[test]
    fn test_malformed_polygon_skipped_in_batch() {
        let bad = Polygon::new(vec![Ring::from_xy(&[
            (0.0, 0.0),
            (f64::NAN, 1.0),
            (1.0, 0.0),
        ])]);
        let buffers = polygons_to_mesh(&[bad, quad()], &MeshOptions::default(), None);

        // The good quad still meshes
        assert_eq!(buffers.vertex_count(), 6);
    }

    #[test]
    fn test_empty_polygon_skipped_in_batch() {
        let empty = Polygon::new(vec![]);
        assert!(matches!(
            triangulate_polygon(&empty, &MeshOptions::default(), false),
            Err(MeshError::MalformedPolygon(_))
        ));

        // The rest of the batch still meshes
        let buffers = polygons_to_mesh(
            &[Polygon::new(vec![]), quad()],
            &MeshOptions::default(),
            None,
        );
        assert_eq!(buffers.vertex_count(), 6);
    }

    #[test]
    fn test_detection_off_keeps_contour_whole() {
        let bowtie = Polygon::new(vec![Ring::from_xy(&[
            (0.0, 0.0),
            (4.0, 4.0),
            (4.0, 0.0),
            (0.0, 4.0),
        ])]);

        let off = MeshOptions {
            detect_self_intersection: false,
            use_earcut: true,
            ..MeshOptions::default()
        };
        // No splitting: one triangulation covering the whole contour
        let results = triangulate_polygon(&bowtie, &off, false).unwrap();
        assert_eq!(results.len(), 1);

        let on = MeshOptions {
            use_earcut: true,
            ..MeshOptions::default()
        };
        assert_eq!(triangulate_polygon(&bowtie, &on, false).unwrap().len(), 2);
    }

    #[test]
    fn test_degenerate_polygon_yields_empty_mesh() {
        let sliver = Polygon::new(vec![Ring::from_xy(&[(0.0, 0.0), (1.0, 1.0), (1.0, 1.0)])]);
        let buffers = polygons_to_mesh(&[sliver], &MeshOptions::default(), None);
        assert!(buffers.is_empty());
    }

    #[test]
    fn test_resampled_mesh_covers_same_area() {
        let options = MeshOptions {
            resolution: Some(1.0),
            ..MeshOptions::default()
        };
        let buffers = polygons_to_mesh(&[quad()], &options, None);

        assert!(buffers.vertex_count() > 6);
        let n = buffers.vertex_count();
        assert!((cap_area(&buffers, n) - 16.0).abs() < 1e-6);
    }

    #[test]
    fn test_ellipsoid_vertices_on_surface() {
        let sphere = Ellipsoid::unit_sphere();
        let polygon = Polygon::new(vec![Ring::from_xy(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ])]);
        let options = MeshOptions {
            resolution: Some(2.0),
            ..MeshOptions::default()
        };
        let buffers = polygons_to_mesh(&[polygon], &options, Some(&sphere));

        assert!(!buffers.is_empty());
        for v in 0..buffers.vertex_count() {
            let x = buffers.positions[v * 3] as f64 + buffers.center[0];
            let y = buffers.positions[v * 3 + 1] as f64 + buffers.center[1];
            let z = buffers.positions[v * 3 + 2] as f64 + buffers.center[2];
            let r = (x * x + y * y + z * z).sqrt();
            assert!((r - 1.0).abs() < 1e-5, "vertex {v} off surface: r = {r}");
        }
    }

    #[test]
    fn test_ellipsoid_normals_radial() {
        let sphere = Ellipsoid::unit_sphere();
        let polygon = Polygon::new(vec![Ring::from_xy(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ])]);
        let buffers = polygons_to_mesh(&[polygon], &MeshOptions::default(), Some(&sphere));

        // On a unit sphere at zero altitude the cap normal equals the
        // surface position direction
        for v in 0..buffers.vertex_count() {
            let px = buffers.positions[v * 3] as f64 + buffers.center[0];
            let py = buffers.positions[v * 3 + 1] as f64 + buffers.center[1];
            let pz = buffers.positions[v * 3 + 2] as f64 + buffers.center[2];
            let dot = px * buffers.normals[v * 3] as f64
                + py * buffers.normals[v * 3 + 1] as f64
                + pz * buffers.normals[v * 3 + 2] as f64;
            assert!((dot - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_bottom_cap_normals_negate_top() {
        let sphere = Ellipsoid::unit_sphere();
        let polygon = Polygon::new(vec![Ring::from_xy(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ])]);
        let options = MeshOptions {
            thickness: 0.1,
            ..MeshOptions::default()
        };
        let buffers = polygons_to_mesh(&[polygon], &options, Some(&sphere));

        // Cap layers mirror per triangle: top emitted (2,1,0), bottom (0,1,2)
        let cap = 6; // 2 triangles
        for t in 0..cap / 3 {
            for k in 0..3 {
                let top_v = t * 3 + (2 - k);
                let bottom_v = cap + t * 3 + k;
                for c in 0..3 {
                    let tn = buffers.normals[top_v * 3 + c];
                    let bn = buffers.normals[bottom_v * 3 + c];
                    assert!((tn + bn).abs() < 1e-6);
                }
            }
        }
    }
}
