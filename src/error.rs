//! Error types for the polygon-to-mesh pipeline

use thiserror::Error;

/// Pipeline result type
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors scoped to a single polygon
///
/// A failure never refers to the whole batch: the batch entry point logs the
/// error and continues with the remaining polygons.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Triangulation cannot locate constrained edges or a seed triangle.
    /// Usually means duplicate points or inconsistent ring topology reached
    /// the triangulator without sanitization.
    #[error("malformed polygon: {0}")]
    MalformedPolygon(String),

    /// Non-finite (NaN/infinite) coordinates, rejected at sanitizer entry
    /// before they can propagate into intersection or triangulation math.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
}

impl MeshError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        MeshError::MalformedPolygon(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        MeshError::UnsupportedInput(msg.into())
    }
}
