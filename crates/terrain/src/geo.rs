//! Geographic primitives shared by tiling schemes, tessellation and meshes.

use glam::DVec3;

/// A position on the ellipsoid in radians and meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cartographic {
    /// Longitude in radians.
    pub longitude: f64,
    /// Latitude in radians.
    pub latitude: f64,
    /// Height above the ellipsoid in meters.
    pub height: f64,
}

impl Cartographic {
    /// Create a new cartographic position.
    #[must_use]
    pub fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }
}

/// An axis-aligned extent.
///
/// Geographic extents are in radians. Native extents use the tiling scheme's
/// own units (degrees or projected meters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Rectangle {
    /// The whole globe in radians.
    pub const MAX_VALUE: Self = Self {
        west: -std::f64::consts::PI,
        south: -std::f64::consts::FRAC_PI_2,
        east: std::f64::consts::PI,
        north: std::f64::consts::FRAC_PI_2,
    };

    /// Create a new rectangle.
    #[must_use]
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// East-west span.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// North-south span.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Center of a geographic rectangle, on the ellipsoid surface.
    #[must_use]
    pub fn center(&self) -> Cartographic {
        Cartographic::new(
            (self.west + self.east) * 0.5,
            (self.south + self.north) * 0.5,
            0.0,
        )
    }

    /// Check if a position lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        (self.west..=self.east).contains(&longitude) && (self.south..=self.north).contains(&latitude)
    }

    /// Convert a rectangle in degrees to radians.
    #[must_use]
    pub fn to_radians(&self) -> Self {
        Self::new(
            self.west.to_radians(),
            self.south.to_radians(),
            self.east.to_radians(),
            self.north.to_radians(),
        )
    }
}

/// A sphere enclosing a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: DVec3,
    pub radius: f64,
}

impl BoundingSphere {
    /// Compute a tight sphere around `points`.
    ///
    /// Both Ritter's sphere (grown from the widest axis-aligned span) and the
    /// sphere centered on the bounding box are computed, and the smaller one
    /// is returned. An empty input yields a zero sphere at the origin.
    #[must_use]
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = DVec3>,
        I::IntoIter: Clone,
    {
        let points = points.into_iter();
        let Some(first) = points.clone().next() else {
            return Self {
                center: DVec3::ZERO,
                radius: 0.0,
            };
        };

        let mut x_min = first;
        let mut y_min = first;
        let mut z_min = first;
        let mut x_max = first;
        let mut y_max = first;
        let mut z_max = first;
        for p in points.clone() {
            if p.x < x_min.x {
                x_min = p;
            }
            if p.x > x_max.x {
                x_max = p;
            }
            if p.y < y_min.y {
                y_min = p;
            }
            if p.y > y_max.y {
                y_max = p;
            }
            if p.z < z_min.z {
                z_min = p;
            }
            if p.z > z_max.z {
                z_max = p;
            }
        }

        // Seed Ritter's sphere with the pair of extreme points furthest apart.
        let x_span = x_max.distance_squared(x_min);
        let y_span = y_max.distance_squared(y_min);
        let z_span = z_max.distance_squared(z_min);
        let (mut diameter1, mut diameter2) = (x_min, x_max);
        let mut max_span = x_span;
        if y_span > max_span {
            max_span = y_span;
            (diameter1, diameter2) = (y_min, y_max);
        }
        if z_span > max_span {
            (diameter1, diameter2) = (z_min, z_max);
        }

        let mut ritter_center = (diameter1 + diameter2) * 0.5;
        let mut radius_squared = diameter2.distance_squared(ritter_center);
        let mut ritter_radius = radius_squared.sqrt();

        let naive_center =
            (DVec3::new(x_min.x, y_min.y, z_min.z) + DVec3::new(x_max.x, y_max.y, z_max.z)) * 0.5;
        let mut naive_radius: f64 = 0.0;

        for p in points {
            naive_radius = naive_radius.max(p.distance(naive_center));

            let old_center_to_point_squared = p.distance_squared(ritter_center);
            if old_center_to_point_squared > radius_squared {
                let old_center_to_point = old_center_to_point_squared.sqrt();
                ritter_radius = (ritter_radius + old_center_to_point) * 0.5;
                radius_squared = ritter_radius * ritter_radius;
                let old_to_new = old_center_to_point - ritter_radius;
                ritter_center = (ritter_center * ritter_radius + p * old_to_new) / old_center_to_point;
            }
        }

        if ritter_radius < naive_radius {
            Self {
                center: ritter_center,
                radius: ritter_radius,
            }
        } else {
            Self {
                center: naive_center,
                radius: naive_radius,
            }
        }
    }
}
