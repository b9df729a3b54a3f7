//! Flat vertex/normal buffer assembly: caps, extrusion walls, material groups
//!
//! Buffer layout is layered: every polygon's top cap first, then (when
//! extruded) every bottom cap, then every side wall. Material groups
//! partition each layer by consecutive source polygons.

use super::ellipsoid::EllipsoidAdapter;
use super::{MaterialGroup, MeshBuffers, MeshOptions};
use crate::triangulate::TriangulationResult;

/// One buffer layer under construction, with a vertex count per source
/// polygon for later group partitioning
#[derive(Default)]
struct Layer {
    positions: Vec<[f64; 3]>,
    normals: Vec<[f64; 3]>,
    counts: Vec<usize>,
}

/// Combine triangulations into render-ready buffers
///
/// `per_polygon` holds one entry per source polygon (possibly several
/// triangulations after self-intersection splitting, possibly empty for a
/// skipped polygon, so `groups` stays aligned with the input order).
pub(crate) fn assemble(
    per_polygon: &[Vec<TriangulationResult>],
    options: &MeshOptions,
    ellipsoid: Option<&dyn EllipsoidAdapter>,
) -> MeshBuffers {
    let extruded = options.thickness > 0.0;
    let top_elevation = options.offset + options.thickness;

    let mut top = Layer::default();
    let mut bottom = Layer::default();
    let mut sides = Layer::default();

    for results in per_polygon {
        let top_start = top.positions.len();
        let bottom_start = bottom.positions.len();
        let side_start = sides.positions.len();

        for result in results {
            for tri in result.indices.chunks(3) {
                // Stored triangles are CW; reversing makes the top cap face
                // up, while the bottom cap keeps stored order to face down
                for &vi in &[tri[2], tri[1], tri[0]] {
                    push_cap_vertex(&mut top, result.points[vi], top_elevation, 1.0, options, ellipsoid);
                }
                if extruded {
                    for &vi in tri {
                        push_cap_vertex(
                            &mut bottom,
                            result.points[vi],
                            options.offset,
                            -1.0,
                            options,
                            ellipsoid,
                        );
                    }
                }
            }

            if extruded {
                for &[i, j] in &result.edges {
                    push_wall(&mut sides, result.points[i], result.points[j], options);
                }
            }
        }

        top.counts.push(top.positions.len() - top_start);
        bottom.counts.push(bottom.positions.len() - bottom_start);
        sides.counts.push(sides.positions.len() - side_start);
    }

    if let Some(adapter) = ellipsoid {
        for layer in [&mut top, &mut bottom, &mut sides] {
            for p in layer.positions.iter_mut() {
                *p = adapter.cartographic_to_position(p[1].to_radians(), p[0].to_radians(), p[2]);
            }
        }
    }

    // Wall normals come from projected triangle geometry: walls are not
    // planar once draped over a curved surface
    for (tri_positions, tri_normals) in sides
        .positions
        .chunks(3)
        .zip(sides.normals.chunks_mut(3))
    {
        let n = triangle_normal(tri_positions[0], tri_positions[1], tri_positions[2]);
        tri_normals.fill(n);
    }

    finish(top, bottom, sides, options, extruded)
}

fn push_cap_vertex(
    layer: &mut Layer,
    point: [f64; 3],
    cap_elevation: f64,
    normal_sign: f64,
    options: &MeshOptions,
    ellipsoid: Option<&dyn EllipsoidAdapter>,
) {
    let z = base_elevation(point, options) + cap_elevation;
    layer.positions.push([point[0], point[1], z]);

    let normal = match ellipsoid {
        // Geodetic surface normal, negated for the bottom cap so the paired
        // bottom vertex always carries the exact negation of its top vertex
        Some(adapter) => {
            let n = adapter.cartographic_to_normal(point[1].to_radians(), point[0].to_radians());
            [n[0] * normal_sign, n[1] * normal_sign, n[2] * normal_sign]
        }
        None => [0.0, 0.0, normal_sign],
    };
    layer.normals.push(normal);
}

/// Two outward-facing triangles joining the bottom and top rings of one
/// constrained edge
fn push_wall(layer: &mut Layer, p: [f64; 3], q: [f64; 3], options: &MeshOptions) {
    let pz = base_elevation(p, options) + options.offset;
    let qz = base_elevation(q, options) + options.offset;

    let b0 = [p[0], p[1], pz];
    let b1 = [q[0], q[1], qz];
    let t0 = [p[0], p[1], pz + options.thickness];
    let t1 = [q[0], q[1], qz + options.thickness];

    // Contour edges run CCW and hole edges CW, so this order faces outward
    // on both
    layer.positions.extend_from_slice(&[b0, b1, t1]);
    layer.positions.extend_from_slice(&[b0, t1, t0]);
    layer.normals.extend_from_slice(&[[0.0; 3]; 6]);
}

fn base_elevation(point: [f64; 3], options: &MeshOptions) -> f64 {
    if options.flat {
        0.0
    } else {
        point[2] * options.altitude_scale
    }
}

/// Per-triangle normal from the cross product of two edge vectors
fn triangle_normal(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [f64; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];

    let nx = u[1] * v[2] - u[2] * v[1];
    let ny = u[2] * v[0] - u[0] * v[2];
    let nz = u[0] * v[1] - u[1] * v[0];

    let len = (nx * nx + ny * ny + nz * nz).sqrt();
    if len > 1e-10 {
        [nx / len, ny / len, nz / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Re-center, downcast to f32 and partition into material groups
fn finish(
    top: Layer,
    bottom: Layer,
    sides: Layer,
    options: &MeshOptions,
    extruded: bool,
) -> MeshBuffers {
    let layers: Vec<&Layer> = if extruded {
        vec![&top, &bottom, &sides]
    } else {
        vec![&top]
    };

    let mut min = [f64::MAX; 3];
    let mut max = [f64::MIN; 3];
    for layer in &layers {
        for p in &layer.positions {
            for k in 0..3 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
    }
    let center = if layers.iter().all(|l| l.positions.is_empty()) {
        [0.0; 3]
    } else {
        [
            (min[0] + max[0]) / 2.0,
            (min[1] + max[1]) / 2.0,
            (min[2] + max[2]) / 2.0,
        ]
    };

    let total: usize = layers.iter().map(|l| l.positions.len()).sum();
    let mut positions = Vec::with_capacity(total * 3);
    let mut normals = Vec::with_capacity(total * 3);
    for layer in &layers {
        for (p, n) in layer.positions.iter().zip(&layer.normals) {
            positions.extend_from_slice(&[
                (p[0] - center[0]) as f32,
                (p[1] - center[1]) as f32,
                (p[2] - center[2]) as f32,
            ]);
            normals.extend_from_slice(&[n[0] as f32, n[1] as f32, n[2] as f32]);
        }
    }

    MeshBuffers {
        positions,
        normals,
        groups: build_groups(&layers, options),
        center,
    }
}

fn build_groups(layers: &[&Layer], options: &MeshOptions) -> Vec<MaterialGroup> {
    let mut groups = Vec::new();
    let mut cursor = 0;
    let mut material = 0;

    match &options.groups {
        Some(polygon_counts) => {
            for layer in layers {
                let mut poly = 0;
                for &span in polygon_counts {
                    let end = (poly + span).min(layer.counts.len());
                    let count: usize = layer.counts[poly..end].iter().sum();
                    groups.push(MaterialGroup {
                        offset: cursor,
                        count,
                        material_index: material,
                    });
                    cursor += count;
                    material += 1;
                    poly = end;
                }
                // Polygons past the declared groups share one trailing range
                if poly < layer.counts.len() {
                    let count: usize = layer.counts[poly..].iter().sum();
                    groups.push(MaterialGroup {
                        offset: cursor,
                        count,
                        material_index: material,
                    });
                    cursor += count;
                    material += 1;
                }
            }
        }
        None => {
            for layer in layers {
                let count: usize = layer.counts.iter().sum();
                groups.push(MaterialGroup {
                    offset: cursor,
                    count,
                    material_index: material,
                });
                cursor += count;
                material += 1;
            }
        }
    }

    groups
}
