pub mod resample;
pub mod sanitize;
pub mod winding;

pub use resample::resample_polygon;
pub use sanitize::{check_finite, dedupe, split_self_intersecting};
pub use winding::{correct_winding, signed_area};

/// An ordered, implicitly closed sequence of coordinates
///
/// The last point connects back to the first; a closing duplicate point is
/// removed during sanitization. Elevation is tracked per ring: 2D input
/// stores `z = 0` with `has_elevation = false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    /// Points as [x, y, z] ([lon, lat, alt] in ellipsoid mode)
    pub points: Vec<[f64; 3]>,
    /// Whether the source data carried a third component
    pub has_elevation: bool,
}

impl Ring {
    /// Build a ring from 2D points (z = 0)
    pub fn from_xy(points: &[(f64, f64)]) -> Self {
        Self {
            points: points.iter().map(|&(x, y)| [x, y, 0.0]).collect(),
            has_elevation: false,
        }
    }

    /// Build a ring from 3D points
    pub fn from_xyz(points: &[(f64, f64, f64)]) -> Self {
        Self {
            points: points.iter().map(|&(x, y, z)| [x, y, z]).collect(),
            has_elevation: true,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean z of the ring's points (0 for 2D rings)
    pub fn mean_elevation(&self) -> f64 {
        if !self.has_elevation || self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p[2]).sum::<f64>() / self.points.len() as f64
    }
}

/// A polygon: one outer contour plus zero or more holes
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// rings[0] is the outer contour, rings[1..] are holes
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    pub fn contour(&self) -> &Ring {
        &self.rings[0]
    }

    pub fn holes(&self) -> &[Ring] {
        &self.rings[1..]
    }
}

/// Axis-aligned 2D bounding box
#[derive(Debug, Clone)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from a set of points
    pub fn from_points(points: &[[f64; 3]]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;

        for p in points {
            min_x = min_x.min(p[0]);
            max_x = max_x.max(p[0]);
            min_y = min_y.min(p[1]);
            max_y = max_y.max(p[1]);
        }

        Some(Self {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// Expand bounds to include another set of points
    pub fn expand(&mut self, points: &[[f64; 3]]) {
        for p in points {
            self.min_x = self.min_x.min(p[0]);
            self.max_x = self.max_x.max(p[0]);
            self.min_y = self.min_y.min(p[1]);
            self.max_y = self.max_y.max(p[1]);
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}
