//! poly2mesh - Convert multi-ring polygons into triangulated, extruded,
//! globe-draped triangle meshes
//!
//! The pipeline tolerates malformed input: rings are deduplicated,
//! self-intersecting contours split into simple sub-polygons with holes
//! re-attached to the right piece, and winding normalized before a
//! constrained Delaunay triangulation (or an ear-clipping fallback) produces
//! boundary-respecting triangles. The assembler extrudes caps and walls,
//! optionally drapes everything over a reference ellipsoid, and emits flat
//! position/normal buffers with per-material vertex ranges.

pub mod error;
pub mod mesh;
pub mod polygon;
pub mod triangulate;

pub use error::{MeshError, Result};
pub use mesh::{
    Ellipsoid, EllipsoidAdapter, MaterialGroup, MeshBuffers, MeshOptions, polygons_to_mesh,
    triangulate_polygon,
};
pub use polygon::{Polygon, Ring};
pub use triangulate::TriangulationResult;
