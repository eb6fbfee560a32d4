//! The interface shared by terrain tile representations.

use crate::ellipsoid::Ellipsoid;
use crate::error::Result;
use crate::geo::Rectangle;
use crate::mesh::CreateMesh;
use crate::tiling::{TileCoord, TilingScheme};
use crate::worker::MeshWorkerPool;

/// Terrain data for a single tile.
///
/// Implementations are immutable once constructed, so one value can be meshed
/// and upsampled from any number of threads.
pub trait TerrainData: Send + Sync {
    /// Start building the renderable mesh for `tile`.
    ///
    /// Returns [`CreateMesh::Pending`] without side effects when the worker
    /// pool is saturated; call again on a later frame.
    fn create_mesh(
        &self,
        pool: &dyn MeshWorkerPool,
        ellipsoid: &Ellipsoid,
        tiling_scheme: &dyn TilingScheme,
        tile: TileCoord,
    ) -> CreateMesh;

    /// Derive data for a child of `tile` from this tile's data.
    ///
    /// `descendant` must be exactly one level below `tile`.
    fn upsample(
        &self,
        tiling_scheme: &dyn TilingScheme,
        tile: TileCoord,
        descendant: TileCoord,
    ) -> Result<Self>
    where
        Self: Sized;

    /// Check whether the given child of `(this_x, this_y)` has its own data.
    fn is_child_available(&self, this_x: u32, this_y: u32, child_x: u32, child_y: u32) -> bool;

    /// Height in meters at a position inside `rectangle`, the extent of this
    /// tile. Returns `None` outside the rectangle.
    fn interpolate_height(&self, rectangle: &Rectangle, longitude: f64, latitude: f64) -> Option<f64>;

    /// Water mask carried by the tile.
    fn water_mask(&self) -> Option<&[u8]>;

    /// Whether the data was synthesized from an ancestor rather than fetched.
    fn was_created_by_upsampling(&self) -> bool;
}
