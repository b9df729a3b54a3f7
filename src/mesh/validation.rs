//! Assembled-buffer validation
//!
//! Diagnostic checks over [`MeshBuffers`](super::MeshBuffers) for consumers
//! that want to verify output before uploading it:
//! - Non-finite positions or normals
//! - Degenerate triangles (zero area)
//! - Normals that are not unit length
//! - Material groups that overlap or overrun the vertex buffer

use super::MeshBuffers;

/// Result of buffer validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Number of triangles inspected
    pub triangles: usize,
    /// Triangles with zero or near-zero area
    pub degenerate: usize,
    /// Vertices with NaN/Inf position or normal components
    pub invalid_coords: usize,
    /// Normals that are not unit length
    pub invalid_normals: usize,
    /// Human-readable issue descriptions
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// No issue that would corrupt rendering
    pub fn is_valid(&self) -> bool {
        self.invalid_coords == 0 && self.warnings.is_empty()
    }

    pub fn has_issues(&self) -> bool {
        self.degenerate > 0
            || self.invalid_coords > 0
            || self.invalid_normals > 0
            || !self.warnings.is_empty()
    }
}

/// Minimum area for a non-degenerate triangle
const MIN_TRIANGLE_AREA: f32 = 1e-10;

/// Validate assembled buffers and return a detailed report
pub fn validate_buffers(buffers: &MeshBuffers) -> ValidationResult {
    let mut result = ValidationResult {
        triangles: buffers.vertex_count() / 3,
        ..Default::default()
    };

    for v in 0..buffers.vertex_count() {
        let p = &buffers.positions[v * 3..v * 3 + 3];
        let n = &buffers.normals[v * 3..v * 3 + 3];
        if !p.iter().chain(n.iter()).all(|c| c.is_finite()) {
            result.invalid_coords += 1;
            continue;
        }

        let len_sq = n[0] * n[0] + n[1] * n[1] + n[2] * n[2];
        if !(0.99..=1.01).contains(&len_sq) {
            result.invalid_normals += 1;
        }
    }

    for t in 0..result.triangles {
        if triangle_area(buffers, t) < MIN_TRIANGLE_AREA {
            result.degenerate += 1;
        }
    }

    check_groups(buffers, &mut result);

    if result.invalid_coords > 0 {
        result
            .warnings
            .push(format!("{} vertices with NaN/Inf components", result.invalid_coords));
    }
    if result.degenerate > 0 {
        result
            .warnings
            .push(format!("{} degenerate triangles", result.degenerate));
    }
    if result.invalid_normals > 0 {
        result
            .warnings
            .push(format!("{} non-unit normals", result.invalid_normals));
    }

    result
}

fn triangle_area(buffers: &MeshBuffers, t: usize) -> f32 {
    let v = |k: usize| {
        let i = (t * 3 + k) * 3;
        [
            buffers.positions[i],
            buffers.positions[i + 1],
            buffers.positions[i + 2],
        ]
    };
    let (a, b, c) = (v(0), v(1), v(2));

    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let w = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];

    let cx = u[1] * w[2] - u[2] * w[1];
    let cy = u[2] * w[0] - u[0] * w[2];
    let cz = u[0] * w[1] - u[1] * w[0];

    0.5 * (cx * cx + cy * cy + cz * cz).sqrt()
}

/// Groups must tile the vertex buffer without overlap or overrun
fn check_groups(buffers: &MeshBuffers, result: &mut ValidationResult) {
    let mut expected_offset = 0;
    for group in &buffers.groups {
        if group.offset != expected_offset {
            result.warnings.push(format!(
                "group {} starts at {} but previous range ends at {}",
                group.material_index, group.offset, expected_offset
            ));
        }
        expected_offset = group.offset + group.count;
    }
    if !buffers.groups.is_empty() && expected_offset != buffers.vertex_count() {
        result.warnings.push(format!(
            "groups cover {} of {} vertices",
            expected_offset,
            buffers.vertex_count()
        ));
    }
}
