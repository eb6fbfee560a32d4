//! Building renderable meshes from heightmap tiles.

use std::f64::consts::TAU;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use glam::DVec3;
use terrain_decode::grid_indices;

use crate::ellipsoid::Ellipsoid;
use crate::error::Result;
use crate::geo::BoundingSphere;
use crate::heightmap::HeightmapTerrainData;
use crate::tessellator::{ATTRIBUTES_PER_VERTEX, MeshRequest, TessellatedGrid};
use crate::tiling::{TileCoord, TilingScheme};
use crate::worker::{MeshWorkerPool, Submission, TaskHandle};

/// Fraction of a tile's sample spacing accepted as geometric error.
pub const HEIGHTMAP_TERRAIN_QUALITY: f64 = 0.25;

/// Upper bound on skirt depth, in meters.
pub const MAXIMUM_SKIRT_HEIGHT: f64 = 1000.0;

/// Geometric error of a level-zero heightmap tile of `width` samples.
#[must_use]
pub fn estimated_level_zero_geometric_error_for_heightmap(
    ellipsoid: &Ellipsoid,
    width: usize,
    tiles_at_level_zero: u32,
) -> f64 {
    ellipsoid.maximum_radius() * TAU * HEIGHTMAP_TERRAIN_QUALITY
        / (width as f64 * f64::from(tiles_at_level_zero))
}

/// Depth of the skirts hung from the edges of a tile at `level`.
#[must_use]
pub fn skirt_height(level_zero_geometric_error: f64, level: u32) -> f64 {
    let level_error = level_zero_geometric_error / f64::from(level).exp2();
    (level_error * 4.0).min(MAXIMUM_SKIRT_HEIGHT)
}

/// Renderable geometry for one tile.
///
/// Vertex positions are relative to `center` to keep `f32` precision.
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    /// Relative-to-center origin.
    pub center: DVec3,
    /// Interleaved x, y, z, height, u, v.
    pub vertices: Vec<f32>,
    /// Triangle list over the vertex grid.
    pub indices: Vec<u32>,
    pub grid_width: usize,
    pub grid_height: usize,
    /// Lowest height of the tile's samples, in meters.
    pub minimum_height: f64,
    /// Highest height of the tile's samples, in meters.
    pub maximum_height: f64,
    pub bounding_sphere: BoundingSphere,
    /// Horizon culling point in the ellipsoid's scaled space.
    pub occludee_point_in_scaled_space: Option<DVec3>,
}

impl TerrainMesh {
    fn from_grid(grid: TessellatedGrid, center: DVec3) -> Self {
        Self {
            center,
            vertices: grid.vertices.iter().map(|&value| value as f32).collect(),
            indices: grid_indices(grid.grid_width, grid.grid_height),
            grid_width: grid.grid_width,
            grid_height: grid.grid_height,
            minimum_height: grid.minimum_height,
            maximum_height: grid.maximum_height,
            bounding_sphere: grid.bounding_sphere,
            occludee_point_in_scaled_space: grid.occludee_point_in_scaled_space,
        }
    }

    /// Number of vertices, skirts included.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / ATTRIBUTES_PER_VERTEX
    }
}

/// An accepted mesh build. Resolves once a worker has tessellated the tile.
#[derive(Debug)]
pub struct MeshTask {
    handle: TaskHandle,
    center: DVec3,
}

impl Future for MeshTask {
    type Output = Result<TerrainMesh>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let center = this.center;
        Pin::new(&mut this.handle)
            .poll(cx)
            .map(|grid| grid.map(|grid| TerrainMesh::from_grid(grid, center)))
    }
}

/// Outcome of a mesh build request.
#[must_use]
#[derive(Debug)]
pub enum CreateMesh {
    /// The build was accepted.
    Ready(MeshTask),
    /// The worker pool is saturated; nothing was queued. Try again later.
    Pending,
}

impl CreateMesh {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, CreateMesh::Pending)
    }

    /// The accepted task, if any.
    #[must_use]
    pub fn into_task(self) -> Option<MeshTask> {
        match self {
            CreateMesh::Ready(task) => Some(task),
            CreateMesh::Pending => None,
        }
    }
}

pub(crate) fn create_mesh(
    data: &HeightmapTerrainData,
    pool: &dyn MeshWorkerPool,
    ellipsoid: &Ellipsoid,
    tiling_scheme: &dyn TilingScheme,
    tile: TileCoord,
) -> CreateMesh {
    let native_rectangle = tiling_scheme.tile_xy_to_native_rectangle(tile.x, tile.y, tile.level);
    let rectangle = tiling_scheme.tile_xy_to_rectangle(tile.x, tile.y, tile.level);
    let center = ellipsoid.cartographic_to_cartesian(rectangle.center());

    let level_zero_error = estimated_level_zero_geometric_error_for_heightmap(
        ellipsoid,
        data.width(),
        tiling_scheme.number_of_x_tiles_at_level(0),
    );
    let skirt_height = skirt_height(level_zero_error, tile.level);

    let request = MeshRequest {
        heights: Arc::clone(data.shared_buffer()),
        structure: Arc::clone(data.structure()),
        width: data.width(),
        height: data.height(),
        native_rectangle,
        rectangle,
        relative_to_center: center,
        ellipsoid: *ellipsoid,
        skirt_height,
        tiling_scheme_kind: tiling_scheme.kind(),
    };

    match pool.try_submit(request) {
        Submission::Accepted(handle) => {
            tracing::debug!(?tile, skirt_height, "Submitted heightmap mesh request");
            CreateMesh::Ready(MeshTask { handle, center })
        }
        Submission::Rejected => {
            tracing::trace!(
                ?tile,
                active = pool.active_tasks(),
                max = pool.max_active_tasks(),
                "Mesh worker pool saturated"
            );
            CreateMesh::Pending
        }
    }
}
