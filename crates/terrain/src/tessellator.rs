//! Heightmap tessellation.
//!
//! Turns a tile's samples into a grid of vertices on the ellipsoid. This is
//! the numerically heavy part of meshing and runs on a mesh worker; see
//! [`crate::worker`].

use std::sync::Arc;

use glam::DVec3;
use terrain_decode::HeightBuffer;

use crate::ellipsoid::Ellipsoid;
use crate::geo::{BoundingSphere, Rectangle};
use crate::heightmap::HeightmapStructure;
use crate::tiling::{TilingSchemeKind, WebMercatorTilingScheme};

/// Number of `f64`/`f32` values per vertex: x, y, z relative to the center,
/// height, u and v.
pub const ATTRIBUTES_PER_VERTEX: usize = 6;

/// Everything a worker needs to tessellate one tile.
#[derive(Debug, Clone)]
pub struct MeshRequest {
    /// Raw samples of the tile.
    pub heights: Arc<HeightBuffer>,
    /// Layout and scaling of the samples.
    pub structure: Arc<HeightmapStructure>,
    /// Samples per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Tile extent in the tiling scheme's native coordinates.
    pub native_rectangle: Rectangle,
    /// Tile extent in radians.
    pub rectangle: Rectangle,
    /// Center that vertex positions are stored relative to.
    pub relative_to_center: DVec3,
    /// Ellipsoid the tile lies on.
    pub ellipsoid: Ellipsoid,
    /// Depth of the skirt hanging from the tile edges, or zero for none.
    pub skirt_height: f64,
    /// Projection of `native_rectangle`.
    pub tiling_scheme_kind: TilingSchemeKind,
}

/// The output of [`tessellate`].
#[derive(Debug, Clone)]
pub struct TessellatedGrid {
    /// `grid_width * grid_height` vertices of [`ATTRIBUTES_PER_VERTEX`]
    /// values each, row by row from the north.
    pub vertices: Vec<f64>,
    pub grid_width: usize,
    pub grid_height: usize,
    /// Lowest height of the tile's own samples, in meters.
    pub minimum_height: f64,
    /// Highest height of the tile's own samples, in meters.
    pub maximum_height: f64,
    /// Sphere enclosing every vertex, in absolute coordinates.
    pub bounding_sphere: BoundingSphere,
    /// Horizon culling point in the ellipsoid's scaled space.
    pub occludee_point_in_scaled_space: Option<DVec3>,
}

/// Tessellate a heightmap tile.
///
/// When the request has a skirt, the grid gains a ring of vertices that
/// repeat the edge posts lowered by the skirt height, so the output is
/// `(width + 2) x (height + 2)`.
#[must_use]
pub fn tessellate(request: &MeshRequest) -> TessellatedGrid {
    let width = request.width;
    let height = request.height;
    let border = usize::from(request.skirt_height > 0.0);
    let grid_width = width + 2 * border;
    let grid_height = height + 2 * border;

    let structure = &request.structure;
    let codec = structure.codec();
    let native = request.native_rectangle;
    let geographic = request.rectangle;
    let ellipsoid = &request.ellipsoid;
    let center = request.relative_to_center;

    let granularity_x = native.width() / (width - 1) as f64;
    let granularity_y = native.height() / (height - 1) as f64;
    let one_over_semimajor_axis = 1.0 / ellipsoid.maximum_radius();

    let mut vertices = Vec::with_capacity(grid_width * grid_height * ATTRIBUTES_PER_VERTEX);
    let mut positions = Vec::with_capacity(grid_width * grid_height);
    let mut minimum_height = f64::INFINITY;
    let mut maximum_height = f64::NEG_INFINITY;

    for row_index in 0..grid_height {
        let row = row_index.saturating_sub(border).min(height - 1);
        let row_is_skirt = row_index < border || row_index >= height + border;

        let native_latitude = native.north - granularity_y * row as f64;
        let latitude = match request.tiling_scheme_kind {
            TilingSchemeKind::Geographic => native_latitude.to_radians(),
            TilingSchemeKind::WebMercator => {
                WebMercatorTilingScheme::mercator_angle_to_geodetic_latitude(
                    native_latitude * one_over_semimajor_axis,
                )
            }
        };
        let v = (latitude - geographic.south) / geographic.height();

        for column_index in 0..grid_width {
            let column = column_index.saturating_sub(border).min(width - 1);
            let is_skirt = row_is_skirt || column_index < border || column_index >= width + border;

            let native_longitude = native.west + granularity_x * column as f64;
            let longitude = match request.tiling_scheme_kind {
                TilingSchemeKind::Geographic => native_longitude.to_radians(),
                TilingSchemeKind::WebMercator => native_longitude * one_over_semimajor_axis,
            };

            let mut height_sample = codec.decode(&request.heights, row * width + column)
                * structure.height_scale
                + structure.height_offset;
            minimum_height = minimum_height.min(height_sample);
            maximum_height = maximum_height.max(height_sample);
            if is_skirt {
                height_sample -= request.skirt_height;
            }

            let normal = ellipsoid.geodetic_surface_normal(longitude, latitude);
            let position = ellipsoid.surface_point(normal) + normal * height_sample;
            positions.push(position);

            let relative = position - center;
            let u = (longitude - geographic.west) / geographic.width();
            vertices.extend_from_slice(&[relative.x, relative.y, relative.z, height_sample, u, v]);
        }
    }

    let bounding_sphere = BoundingSphere::from_points(positions.iter().copied());
    let occludee_point_in_scaled_space = horizon_culling_point(ellipsoid, center, &positions);

    TessellatedGrid {
        vertices,
        grid_width,
        grid_height,
        minimum_height,
        maximum_height,
        bounding_sphere,
        occludee_point_in_scaled_space,
    }
}

/// Compute a point in the ellipsoid's scaled space, along
/// `direction_to_point`, that is hidden by the ellipsoid only when every one
/// of `positions` is hidden.
///
/// Returns `None` when no such point exists.
#[must_use]
pub fn horizon_culling_point(
    ellipsoid: &Ellipsoid,
    direction_to_point: DVec3,
    positions: &[DVec3],
) -> Option<DVec3> {
    let scaled_direction = ellipsoid
        .transform_position_to_scaled_space(direction_to_point)
        .try_normalize()?;

    let mut magnitude: f64 = 0.0;
    for &position in positions {
        let candidate = horizon_magnitude(ellipsoid, position, scaled_direction);
        if candidate.is_nan() {
            return None;
        }
        magnitude = magnitude.max(candidate);
    }

    (magnitude > 0.0 && magnitude.is_finite()).then(|| scaled_direction * magnitude)
}

fn horizon_magnitude(ellipsoid: &Ellipsoid, position: DVec3, scaled_direction: DVec3) -> f64 {
    let scaled_position = ellipsoid.transform_position_to_scaled_space(position);
    let magnitude_squared = scaled_position.length_squared();
    let direction = scaled_position / magnitude_squared.sqrt();

    // Points below the ellipsoid are treated as lying on it.
    let magnitude_squared = magnitude_squared.max(1.0);
    let magnitude = magnitude_squared.sqrt();

    let cos_alpha = direction.dot(scaled_direction);
    let sin_alpha = direction.cross(scaled_direction).length();
    let cos_beta = 1.0 / magnitude;
    let sin_beta = (magnitude_squared - 1.0).sqrt() * cos_beta;

    1.0 / (cos_alpha * cos_beta - sin_alpha * sin_beta)
}
