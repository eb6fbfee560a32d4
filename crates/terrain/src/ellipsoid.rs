//! Reference ellipsoid.

use glam::DVec3;

use crate::geo::Cartographic;

/// An ellipsoid centered at the origin, defined by its radii along x, y and z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    radii: DVec3,
    radii_squared: DVec3,
    one_over_radii: DVec3,
}

impl Ellipsoid {
    /// The WGS84 ellipsoid.
    pub const WGS84: Self = Self::new(6_378_137.0, 6_378_137.0, 6_356_752.314_245_179);

    /// A sphere of radius one.
    pub const UNIT_SPHERE: Self = Self::new(1.0, 1.0, 1.0);

    /// Create an ellipsoid from its radii in meters.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            radii: DVec3::new(x, y, z),
            radii_squared: DVec3::new(x * x, y * y, z * z),
            one_over_radii: DVec3::new(1.0 / x, 1.0 / y, 1.0 / z),
        }
    }

    /// Radii along x, y and z.
    #[must_use]
    pub fn radii(&self) -> DVec3 {
        self.radii
    }

    /// The largest of the three radii.
    #[must_use]
    pub fn maximum_radius(&self) -> f64 {
        self.radii.max_element()
    }

    /// Unit normal to the ellipsoid surface at a geodetic position.
    #[must_use]
    pub fn geodetic_surface_normal(&self, longitude: f64, latitude: f64) -> DVec3 {
        let cos_latitude = latitude.cos();
        DVec3::new(
            cos_latitude * longitude.cos(),
            cos_latitude * longitude.sin(),
            latitude.sin(),
        )
        .normalize()
    }

    /// Earth-centered Cartesian position of a cartographic position.
    #[must_use]
    pub fn cartographic_to_cartesian(&self, cartographic: Cartographic) -> DVec3 {
        let n = self.geodetic_surface_normal(cartographic.longitude, cartographic.latitude);
        self.surface_point(n) + n * cartographic.height
    }

    /// Point on the surface whose geodetic normal is `normal`.
    #[must_use]
    pub fn surface_point(&self, normal: DVec3) -> DVec3 {
        let k = self.radii_squared * normal;
        let gamma = normal.dot(k).sqrt();
        k / gamma
    }

    /// Scale a position so that the ellipsoid becomes the unit sphere.
    #[must_use]
    pub fn transform_position_to_scaled_space(&self, position: DVec3) -> DVec3 {
        position * self.one_over_radii
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}
