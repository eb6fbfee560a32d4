//! Tiling schemes: how the globe is partitioned into a quadtree of tiles.
//!
//! Tile `x` grows eastward and tile `y` grows southward from the north-west
//! corner of the scheme's rectangle.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::ellipsoid::Ellipsoid;
use crate::geo::Rectangle;

/// Coordinates of one tile in a tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub level: u32,
}

impl TileCoord {
    /// Create new tile coordinates.
    #[must_use]
    pub fn new(x: u32, y: u32, level: u32) -> Self {
        Self { x, y, level }
    }

    /// The four children, in southwest, southeast, northwest, northeast order.
    #[must_use]
    pub fn children(&self) -> [Self; 4] {
        let (x, y, level) = (self.x * 2, self.y * 2, self.level + 1);
        [
            Self::new(x, y + 1, level),
            Self::new(x + 1, y + 1, level),
            Self::new(x, y, level),
            Self::new(x + 1, y, level),
        ]
    }
}

/// Projection used by a tiling scheme's native coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilingSchemeKind {
    /// Native coordinates are longitude and latitude in degrees.
    Geographic,
    /// Native coordinates are spherical mercator meters.
    WebMercator,
}

/// A quadtree partition of the globe.
pub trait TilingScheme: Send + Sync {
    /// The ellipsoid being tiled.
    fn ellipsoid(&self) -> &Ellipsoid;

    /// The geographic extent covered by the scheme, in radians.
    fn rectangle(&self) -> Rectangle;

    /// Projection of the native coordinates.
    fn kind(&self) -> TilingSchemeKind;

    /// Number of tiles along x at `level`.
    fn number_of_x_tiles_at_level(&self, level: u32) -> u32;

    /// Number of tiles along y at `level`.
    fn number_of_y_tiles_at_level(&self, level: u32) -> u32;

    /// Geographic extent of a tile, in radians.
    fn tile_xy_to_rectangle(&self, x: u32, y: u32, level: u32) -> Rectangle;

    /// Extent of a tile in the scheme's native coordinates.
    fn tile_xy_to_native_rectangle(&self, x: u32, y: u32, level: u32) -> Rectangle;
}

/// Split `rectangle` into an even grid and return cell `(x, y)`, counting
/// rows from the north.
fn grid_cell(rectangle: Rectangle, x_tiles: u32, y_tiles: u32, x: u32, y: u32) -> Rectangle {
    let tile_width = rectangle.width() / f64::from(x_tiles);
    let tile_height = rectangle.height() / f64::from(y_tiles);
    Rectangle::new(
        rectangle.west + f64::from(x) * tile_width,
        rectangle.north - f64::from(y + 1) * tile_height,
        rectangle.west + f64::from(x + 1) * tile_width,
        rectangle.north - f64::from(y) * tile_height,
    )
}

/// Equirectangular tiling with two tiles at level zero.
#[derive(Debug, Clone)]
pub struct GeographicTilingScheme {
    ellipsoid: Ellipsoid,
    rectangle: Rectangle,
    level_zero_x_tiles: u32,
    level_zero_y_tiles: u32,
}

impl GeographicTilingScheme {
    /// Create a scheme covering the whole globe of `ellipsoid`.
    #[must_use]
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self {
            ellipsoid,
            rectangle: Rectangle::MAX_VALUE,
            level_zero_x_tiles: 2,
            level_zero_y_tiles: 1,
        }
    }

    /// Override the number of level-zero tiles.
    #[must_use]
    pub fn with_level_zero_tiles(mut self, x_tiles: u32, y_tiles: u32) -> Self {
        self.level_zero_x_tiles = x_tiles;
        self.level_zero_y_tiles = y_tiles;
        self
    }
}

impl Default for GeographicTilingScheme {
    fn default() -> Self {
        Self::new(Ellipsoid::WGS84)
    }
}

impl TilingScheme for GeographicTilingScheme {
    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    fn rectangle(&self) -> Rectangle {
        self.rectangle
    }

    fn kind(&self) -> TilingSchemeKind {
        TilingSchemeKind::Geographic
    }

    fn number_of_x_tiles_at_level(&self, level: u32) -> u32 {
        self.level_zero_x_tiles << level
    }

    fn number_of_y_tiles_at_level(&self, level: u32) -> u32 {
        self.level_zero_y_tiles << level
    }

    fn tile_xy_to_rectangle(&self, x: u32, y: u32, level: u32) -> Rectangle {
        grid_cell(
            self.rectangle,
            self.number_of_x_tiles_at_level(level),
            self.number_of_y_tiles_at_level(level),
            x,
            y,
        )
    }

    fn tile_xy_to_native_rectangle(&self, x: u32, y: u32, level: u32) -> Rectangle {
        let rectangle = self.tile_xy_to_rectangle(x, y, level);
        Rectangle::new(
            rectangle.west.to_degrees(),
            rectangle.south.to_degrees(),
            rectangle.east.to_degrees(),
            rectangle.north.to_degrees(),
        )
    }
}

/// Spherical mercator tiling with a single tile at level zero.
#[derive(Debug, Clone)]
pub struct WebMercatorTilingScheme {
    ellipsoid: Ellipsoid,
    semimajor_axis: f64,
    /// Extent of the scheme in projected meters.
    native_rectangle: Rectangle,
}

impl WebMercatorTilingScheme {
    /// Latitude at which the projection becomes square, in radians.
    pub const MAXIMUM_LATITUDE: f64 = 1.484_422_229_745_332_4;

    /// Create a scheme covering the whole (square) mercator plane.
    #[must_use]
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        let semimajor_axis = ellipsoid.maximum_radius();
        let half = PI * semimajor_axis;
        Self {
            ellipsoid,
            semimajor_axis,
            native_rectangle: Rectangle::new(-half, -half, half, half),
        }
    }

    /// Convert a mercator y angle to a geodetic latitude.
    #[must_use]
    pub fn mercator_angle_to_geodetic_latitude(mercator_angle: f64) -> f64 {
        FRAC_PI_2 - 2.0 * (-mercator_angle).exp().atan()
    }

    /// Convert a geodetic latitude to a mercator y angle.
    #[must_use]
    pub fn geodetic_latitude_to_mercator_angle(latitude: f64) -> f64 {
        let latitude = latitude.clamp(-Self::MAXIMUM_LATITUDE, Self::MAXIMUM_LATITUDE);
        let sin_latitude = latitude.sin();
        0.5 * ((1.0 + sin_latitude) / (1.0 - sin_latitude)).ln()
    }

    fn unproject(&self, native: Rectangle) -> Rectangle {
        let one_over_axis = 1.0 / self.semimajor_axis;
        Rectangle::new(
            native.west * one_over_axis,
            Self::mercator_angle_to_geodetic_latitude(native.south * one_over_axis),
            native.east * one_over_axis,
            Self::mercator_angle_to_geodetic_latitude(native.north * one_over_axis),
        )
    }
}

impl Default for WebMercatorTilingScheme {
    fn default() -> Self {
        Self::new(Ellipsoid::WGS84)
    }
}

impl TilingScheme for WebMercatorTilingScheme {
    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    fn rectangle(&self) -> Rectangle {
        self.unproject(self.native_rectangle)
    }

    fn kind(&self) -> TilingSchemeKind {
        TilingSchemeKind::WebMercator
    }

    fn number_of_x_tiles_at_level(&self, level: u32) -> u32 {
        1 << level
    }

    fn number_of_y_tiles_at_level(&self, level: u32) -> u32 {
        1 << level
    }

    fn tile_xy_to_rectangle(&self, x: u32, y: u32, level: u32) -> Rectangle {
        self.unproject(self.tile_xy_to_native_rectangle(x, y, level))
    }

    fn tile_xy_to_native_rectangle(&self, x: u32, y: u32, level: u32) -> Rectangle {
        grid_cell(
            self.native_rectangle,
            self.number_of_x_tiles_at_level(level),
            self.number_of_y_tiles_at_level(level),
            x,
            y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rectangle_eq(actual: Rectangle, expected: Rectangle) {
        for (a, e) in [
            (actual.west, expected.west),
            (actual.south, expected.south),
            (actual.east, expected.east),
            (actual.north, expected.north),
        ] {
            assert!((a - e).abs() < 1e-9, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_tile_coord_children() {
        let children = TileCoord::new(3, 1, 4).children();
        assert_eq!(children[0], TileCoord::new(6, 3, 5));
        assert_eq!(children[1], TileCoord::new(7, 3, 5));
        assert_eq!(children[2], TileCoord::new(6, 2, 5));
        assert_eq!(children[3], TileCoord::new(7, 2, 5));
    }

    #[test]
    fn test_geographic_level_zero() {
        let scheme = GeographicTilingScheme::default();
        assert_eq!(scheme.number_of_x_tiles_at_level(0), 2);
        assert_eq!(scheme.number_of_y_tiles_at_level(0), 1);
        assert_rectangle_eq(
            scheme.tile_xy_to_rectangle(0, 0, 0),
            Rectangle::new(-PI, -FRAC_PI_2, 0.0, FRAC_PI_2),
        );
        assert_rectangle_eq(
            scheme.tile_xy_to_rectangle(1, 0, 0),
            Rectangle::new(0.0, -FRAC_PI_2, PI, FRAC_PI_2),
        );
    }

    #[test]
    fn test_geographic_y_grows_southward() {
        let scheme = GeographicTilingScheme::default();
        let north = scheme.tile_xy_to_rectangle(0, 0, 1);
        let south = scheme.tile_xy_to_rectangle(0, 1, 1);
        assert!((north.south - south.north).abs() < 1e-12);
        assert!(north.north > south.north);
    }

    #[test]
    fn test_geographic_native_is_degrees() {
        let scheme = GeographicTilingScheme::default();
        assert_rectangle_eq(
            scheme.tile_xy_to_native_rectangle(3, 1, 1),
            Rectangle::new(90.0, -90.0, 180.0, 0.0),
        );
    }

    #[test]
    fn test_web_mercator_is_square() {
        let scheme = WebMercatorTilingScheme::default();
        let rectangle = scheme.rectangle();
        assert!((rectangle.north - WebMercatorTilingScheme::MAXIMUM_LATITUDE).abs() < 1e-9);
        assert!((rectangle.south + WebMercatorTilingScheme::MAXIMUM_LATITUDE).abs() < 1e-9);
        assert!((rectangle.east - PI).abs() < 1e-12);
    }

    #[test]
    fn test_web_mercator_native_and_geographic_agree() {
        let scheme = WebMercatorTilingScheme::default();
        let native = scheme.tile_xy_to_native_rectangle(1, 0, 1);
        let geographic = scheme.tile_xy_to_rectangle(1, 0, 1);
        assert!(native.south.abs() < 1e-6);
        assert!(geographic.south.abs() < 1e-12);
        assert!((geographic.west - 0.0).abs() < 1e-12);
        assert!((geographic.east - PI).abs() < 1e-12);
    }

    #[test]
    fn test_mercator_latitude_round_trip() {
        for latitude in [-1.2, -0.3, 0.0, 0.5, 1.1] {
            let angle = WebMercatorTilingScheme::geodetic_latitude_to_mercator_angle(latitude);
            let back = WebMercatorTilingScheme::mercator_angle_to_geodetic_latitude(angle);
            assert!((back - latitude).abs() < 1e-12);
        }
    }
}
