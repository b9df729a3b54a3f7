//! Surface-projection collaborator for globe-draped meshes
//!
//! The pipeline only needs two mappings from a geodetic coordinate: a
//! Cartesian position and a surface normal. Renderers with their own globe
//! math implement [`EllipsoidAdapter`] directly; the bundled [`Ellipsoid`]
//! covers stand-alone use and testing.

/// Maps geodetic coordinates onto a curved reference surface
pub trait EllipsoidAdapter {
    /// Cartesian position for (latitude, longitude) in radians at `altitude`
    fn cartographic_to_position(&self, lat_rad: f64, lon_rad: f64, altitude: f64) -> [f64; 3];

    /// Outward unit surface normal at (latitude, longitude) in radians
    fn cartographic_to_normal(&self, lat_rad: f64, lon_rad: f64) -> [f64; 3];
}

/// Reference ellipsoid centered at the origin, z toward the north pole,
/// x toward (lat 0, lon 0)
#[derive(Debug, Clone)]
pub struct Ellipsoid {
    radii_squared: [f64; 3],
}

impl Ellipsoid {
    pub fn new(radii: [f64; 3]) -> Self {
        Self {
            radii_squared: [
                radii[0] * radii[0],
                radii[1] * radii[1],
                radii[2] * radii[2],
            ],
        }
    }

    /// WGS84 radii in meters
    pub fn wgs84() -> Self {
        Self::new([6378137.0, 6378137.0, 6356752.314245179])
    }

    /// Unit sphere, convenient for tests and unit-free scenes
    pub fn unit_sphere() -> Self {
        Self::new([1.0, 1.0, 1.0])
    }
}

impl EllipsoidAdapter for Ellipsoid {
    fn cartographic_to_position(&self, lat_rad: f64, lon_rad: f64, altitude: f64) -> [f64; 3] {
        let n = self.cartographic_to_normal(lat_rad, lon_rad);

        // Scale the geodetic normal onto the surface: k = r² ∘ n, p = k / √(n·k)
        let k = [
            self.radii_squared[0] * n[0],
            self.radii_squared[1] * n[1],
            self.radii_squared[2] * n[2],
        ];
        let gamma = (n[0] * k[0] + n[1] * k[1] + n[2] * k[2]).sqrt();

        [
            k[0] / gamma + altitude * n[0],
            k[1] / gamma + altitude * n[1],
            k[2] / gamma + altitude * n[2],
        ]
    }

    fn cartographic_to_normal(&self, lat_rad: f64, lon_rad: f64) -> [f64; 3] {
        let cos_lat = lat_rad.cos();
        [cos_lat * lon_rad.cos(), cos_lat * lon_rad.sin(), lat_rad.sin()]
    }
}
