//! Constrained Delaunay triangulation with interior flood fill
//!
//! Triangles live in an arena indexed by integer id; each triangle stores its
//! three vertices counter-clockwise plus a neighbor id per edge (the edge
//! opposite the vertex with the same index). Boundary and hole segments are
//! forced into the triangulation by diagonal flipping, then a stack-based
//! depth-first flood over the adjacency graph collects exactly the triangles
//! inside the outer contour and outside every hole: the flood starts on the
//! interior side of the first constrained edge and never crosses a
//! constrained edge.

use std::collections::{HashSet, VecDeque};

use crate::error::{MeshError, Result};

/// Strictness tolerance for orientation / intersection tests
const GEOM_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
struct Tri {
    /// Vertex indices, counter-clockwise
    v: [usize; 3],
    /// n[i] is the neighbor across the edge opposite v[i]
    n: [Option<usize>; 3],
    removed: bool,
}

struct Arena {
    points: Vec<[f64; 2]>,
    tris: Vec<Tri>,
    /// Scales the circumcircle test to the coordinate magnitude
    circle_epsilon: f64,
}

/// Triangulate `points` so every edge in `edges` is present, then keep only
/// the triangles on the interior side of the constraints
///
/// Returns flat triangle indices in the pipeline's clockwise convention.
pub fn triangulate_constrained(points: &[[f64; 3]], edges: &[[usize; 2]]) -> Result<Vec<usize>> {
    if edges.is_empty() {
        return Err(MeshError::malformed("no constrained edges"));
    }

    let xy: Vec<[f64; 2]> = points.iter().map(|p| [p[0], p[1]]).collect();
    let mut arena = Arena::delaunay(xy)?;

    for edge in edges {
        arena.insert_constraint(edge[0], edge[1])?;
    }

    let inside = arena.flood_interior(edges)?;

    let mut indices = Vec::with_capacity(inside.len() * 3);
    for id in inside {
        let v = arena.tris[id].v;
        // Arena triangles are CCW; the pipeline stores CW
        indices.extend_from_slice(&[v[0], v[2], v[1]]);
    }
    Ok(indices)
}

impl Arena {
    /// Incremental Bowyer-Watson over all points inside a super-triangle
    fn delaunay(input: Vec<[f64; 2]>) -> Result<Self> {
        let n = input.len();
        if n < 3 {
            return Err(MeshError::malformed("fewer than 3 points"));
        }

        let mut min = [f64::MAX; 2];
        let mut max = [f64::MIN; 2];
        for p in &input {
            for k in 0..2 {
                min[k] = min[k].min(p[k]);
                max[k] = max[k].max(p[k]);
            }
        }
        let cx = (min[0] + max[0]) / 2.0;
        let cy = (min[1] + max[1]) / 2.0;
        let extent = (max[0] - min[0]).max(max[1] - min[1]).max(1.0);
        let d = extent * 16.0;

        let mut points = input;
        points.push([cx - 2.0 * d, cy - d]);
        points.push([cx + 2.0 * d, cy - d]);
        points.push([cx, cy + 2.0 * d]);

        let mut arena = Arena {
            points,
            tris: vec![Tri {
                v: [n, n + 1, n + 2],
                n: [None; 3],
                removed: false,
            }],
            circle_epsilon: GEOM_EPSILON * extent.powi(4),
        };

        for i in 0..n {
            arena.insert_point(i)?;
        }
        Ok(arena)
    }

    /// Bowyer-Watson step: carve the cavity of triangles whose circumcircle
    /// contains the point, then fan new triangles from the point to the
    /// cavity boundary
    fn insert_point(&mut self, p: usize) -> Result<()> {
        let cavity: Vec<usize> = (0..self.tris.len())
            .filter(|&id| !self.tris[id].removed && self.in_circumcircle(id, p))
            .collect();
        if cavity.is_empty() {
            // Exact duplicate of an existing vertex: the circumcircle test is
            // never strict for it. Leave it out; constraint insertion will
            // report the polygon if the point was load-bearing.
            return Ok(());
        }
        let in_cavity: HashSet<usize> = cavity.iter().copied().collect();

        // Boundary edges of the cavity, directed CCW around it, with the
        // cavity triangle that contributed each edge
        let mut boundary: Vec<([usize; 2], Option<usize>, usize)> = Vec::new();
        for &id in &cavity {
            let tri = self.tris[id].clone();
            for j in 0..3 {
                let outside = match tri.n[j] {
                    Some(nb) => !in_cavity.contains(&nb),
                    None => true,
                };
                if outside {
                    boundary.push(([tri.v[(j + 1) % 3], tri.v[(j + 2) % 3]], tri.n[j], id));
                }
            }
            self.tris[id].removed = true;
        }

        // One new triangle per boundary edge
        let base = self.tris.len();
        for (k, &([a, b], outer, source)) in boundary.iter().enumerate() {
            self.tris.push(Tri {
                v: [a, b, p],
                n: [None, None, outer],
                removed: false,
            });
            if let Some(out) = outer {
                self.replace_neighbor(out, source, base + k);
            }
        }

        // Stitch the fan: edge (b, p) of one triangle meets edge (p, a') of
        // the triangle whose boundary edge starts at b
        for k in 0..boundary.len() {
            let (edge, _, _) = boundary[k];
            let next = boundary
                .iter()
                .position(|&([a, _], _, _)| a == edge[1])
                .ok_or_else(|| MeshError::malformed("open cavity boundary"))?;
            let prev = boundary
                .iter()
                .position(|&([_, b], _, _)| b == edge[0])
                .ok_or_else(|| MeshError::malformed("open cavity boundary"))?;
            self.tris[base + k].n[0] = Some(base + next);
            self.tris[base + k].n[1] = Some(base + prev);
        }
        Ok(())
    }

    fn replace_neighbor(&mut self, id: usize, old: usize, new: usize) {
        for slot in self.tris[id].n.iter_mut() {
            if *slot == Some(old) {
                *slot = Some(new);
            }
        }
    }

    /// Strict circumcircle containment for CCW triangle `id`
    fn in_circumcircle(&self, id: usize, p: usize) -> bool {
        let [a, b, c] = self.tris[id].v;
        let pt = self.points[p];
        let (ax, ay) = delta(self.points[a], pt);
        let (bx, by) = delta(self.points[b], pt);
        let (cx, cy) = delta(self.points[c], pt);

        let det = (ax * ax + ay * ay) * (bx * cy - cx * by)
            - (bx * bx + by * by) * (ax * cy - cx * ay)
            + (cx * cx + cy * cy) * (ax * by - bx * ay);
        det > self.circle_epsilon
    }

    /// Force edge (a, b) into the triangulation by flipping every diagonal
    /// that crosses it
    fn insert_constraint(&mut self, a: usize, b: usize) -> Result<()> {
        if self.edge_exists(a, b) {
            return Ok(());
        }

        let mut queue: VecDeque<[usize; 2]> = self.crossing_edges(a, b).into();
        if queue.is_empty() {
            return Err(MeshError::malformed(format!(
                "constrained edge ({a}, {b}) is absent and nothing crosses it; \
                 duplicate or collinear points in input"
            )));
        }

        let mut budget = queue.len() * queue.len() * 8 + 64;
        while let Some([u, v]) = queue.pop_front() {
            if self.edge_exists(a, b) {
                return Ok(());
            }
            budget = budget
                .checked_sub(1)
                .ok_or_else(|| MeshError::malformed("constraint recovery did not converge"))?;

            // The edge may have been flipped away already
            if !self.edge_exists(u, v) {
                continue;
            }
            match self.flip(u, v)? {
                Some([p, q]) => {
                    if p != a
                        && p != b
                        && q != a
                        && q != b
                        && properly_intersect(
                            self.points[a],
                            self.points[b],
                            self.points[p],
                            self.points[q],
                        )
                    {
                        queue.push_back([p, q]);
                    }
                }
                // Non-convex quad: retry after surrounding flips
                None => queue.push_back([u, v]),
            }
        }

        if self.edge_exists(a, b) {
            Ok(())
        } else {
            Err(MeshError::malformed(format!(
                "could not recover constrained edge ({a}, {b})"
            )))
        }
    }

    /// All live undirected edges properly crossing segment (a, b)
    fn crossing_edges(&self, a: usize, b: usize) -> Vec<[usize; 2]> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for tri in self.tris.iter().filter(|t| !t.removed) {
            for j in 0..3 {
                let u = tri.v[j];
                let v = tri.v[(j + 1) % 3];
                let key = (u.min(v), u.max(v));
                if u == a || u == b || v == a || v == b || !seen.insert(key) {
                    continue;
                }
                if properly_intersect(self.points[a], self.points[b], self.points[u], self.points[v])
                {
                    out.push([key.0, key.1]);
                }
            }
        }
        out
    }

    fn edge_exists(&self, a: usize, b: usize) -> bool {
        self.find_directed(a, b).is_some() || self.find_directed(b, a).is_some()
    }

    /// Triangle id and edge slot holding the directed edge (a, b)
    fn find_directed(&self, a: usize, b: usize) -> Option<(usize, usize)> {
        for (id, tri) in self.tris.iter().enumerate() {
            if tri.removed {
                continue;
            }
            for j in 0..3 {
                if tri.v[j] == a && tri.v[(j + 1) % 3] == b {
                    // Edge (v[j], v[j+1]) is opposite v[j+2]
                    return Some((id, (j + 2) % 3));
                }
            }
        }
        None
    }

    /// Flip the diagonal (u, v); returns the new diagonal, or None when the
    /// surrounding quad is not strictly convex
    fn flip(&mut self, u: usize, v: usize) -> Result<Option<[usize; 2]>> {
        let (t1, slot1) = self
            .find_directed(u, v)
            .ok_or_else(|| MeshError::malformed("flip edge vanished"))?;
        let t2 = self.tris[t1].n[slot1]
            .ok_or_else(|| MeshError::malformed("constrained edge crosses the hull"))?;

        let p = self.tris[t1].v[slot1];
        let slot2 = (0..3)
            .find(|&j| {
                let tri = &self.tris[t2];
                tri.v[j] != u && tri.v[j] != v
            })
            .ok_or_else(|| MeshError::malformed("degenerate adjacency"))?;
        let q = self.tris[t2].v[slot2];

        // Flippable only if the new diagonal crosses the old one
        if !properly_intersect(self.points[p], self.points[q], self.points[u], self.points[v]) {
            return Ok(None);
        }

        // Outer neighbors of the quad (u, q, v, p)
        let n_vp = self.neighbor_across(t1, v, p);
        let n_pu = self.neighbor_across(t1, p, u);
        let n_uq = self.neighbor_across(t2, u, q);
        let n_qv = self.neighbor_across(t2, q, v);

        self.tris[t1] = Tri {
            v: [u, q, p],
            n: [Some(t2), n_pu, n_uq],
            removed: false,
        };
        self.tris[t2] = Tri {
            v: [q, v, p],
            n: [n_vp, Some(t1), n_qv],
            removed: false,
        };

        if let Some(nb) = n_uq {
            self.replace_neighbor(nb, t2, t1);
        }
        if let Some(nb) = n_vp {
            self.replace_neighbor(nb, t1, t2);
        }

        Ok(Some([p, q]))
    }

    /// Neighbor of `id` across its directed edge (a, b)
    fn neighbor_across(&self, id: usize, a: usize, b: usize) -> Option<usize> {
        let tri = &self.tris[id];
        (0..3)
            .find(|&j| tri.v[j] == a && tri.v[(j + 1) % 3] == b)
            .and_then(|j| tri.n[(j + 2) % 3])
    }

    /// Depth-first flood from the interior side of the first constrained
    /// edge, never crossing a constrained edge
    fn flood_interior(&self, edges: &[[usize; 2]]) -> Result<Vec<usize>> {
        let constrained: HashSet<(usize, usize)> = edges
            .iter()
            .map(|e| (e[0].min(e[1]), e[0].max(e[1])))
            .collect();

        // The contour is CCW, so the triangle holding the directed first
        // edge lies to its left: inside the polygon
        let [a, b] = edges[0];
        let (seed, _) = self.find_directed(a, b).ok_or_else(|| {
            MeshError::malformed(
                "seed triangle not found; sanitize the polygon before triangulating",
            )
        })?;

        let mut visited = vec![false; self.tris.len()];
        let mut stack = vec![seed];
        let mut inside = Vec::new();
        visited[seed] = true;

        while let Some(id) = stack.pop() {
            inside.push(id);
            let tri = &self.tris[id];
            for j in 0..3 {
                let u = tri.v[(j + 1) % 3];
                let v = tri.v[(j + 2) % 3];
                if constrained.contains(&(u.min(v), u.max(v))) {
                    continue;
                }
                if let Some(nb) = tri.n[j] {
                    if !visited[nb] && !self.tris[nb].removed {
                        visited[nb] = true;
                        stack.push(nb);
                    }
                }
            }
        }
        Ok(inside)
    }
}

fn delta(a: [f64; 2], p: [f64; 2]) -> (f64, f64) {
    (a[0] - p[0], a[1] - p[1])
}

fn orient(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Strict segment intersection: crossing interiors, no shared endpoints
fn properly_intersect(a: [f64; 2], b: [f64; 2], c: [f64; 2], d: [f64; 2]) -> bool {
    let d1 = orient(a, b, c);
    let d2 = orient(a, b, d);
    let d3 = orient(c, d, a);
    let d4 = orient(c, d, b);

    if d1.abs() < GEOM_EPSILON
        || d2.abs() < GEOM_EPSILON
        || d3.abs() < GEOM_EPSILON
        || d4.abs() < GEOM_EPSILON
    {
        return false;
    }
    (d1 > 0.0) != (d2 > 0.0) && (d3 > 0.0) != (d4 > 0.0)
}
