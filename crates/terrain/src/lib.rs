//! Heightmap terrain tiles for a quadtree-tiled globe.
//!
//! This crate stores the elevation samples of one terrain tile, turns them
//! into a renderable mesh on a pool of worker threads, and synthesizes data
//! for child tiles that have none of their own.
//!
//! # Design principles
//!
//! - **Immutable tiles**: Tile data never changes after construction and can
//!   be shared across threads
//! - **Non-blocking meshing**: A saturated worker pool yields
//!   [`CreateMesh::Pending`] instead of queueing
//! - **Consistent refinement**: Upsampled children lie exactly on their
//!   parent's mesh
//!
//! # Example
//!
//! ```ignore
//! use terrain::{
//!     Ellipsoid, GeographicTilingScheme, HeightmapTerrainData, TerrainData, TileCoord,
//!     WorkerPool, WorkerPoolConfig,
//! };
//!
//! let pool = WorkerPool::new(&WorkerPoolConfig::default())?;
//! let scheme = GeographicTilingScheme::default();
//! let tile = TileCoord::new(0, 0, 0);
//!
//! let data = HeightmapTerrainData::from_heightmap_bytes(&bytes)?;
//! if let Some(task) = data.create_mesh(&pool, &Ellipsoid::WGS84, &scheme, tile).into_task() {
//!     let mesh = task.await?;
//! }
//!
//! // Children without their own data are derived from the parent.
//! let child = data.upsample(&scheme, tile, tile.children()[0])?;
//! ```

mod ellipsoid;
mod error;
mod geo;
mod heightmap;
mod mesh;
mod terrain_data;
pub mod tessellator;
pub mod tiling;
mod upsample;
pub mod worker;

pub use ellipsoid::Ellipsoid;
pub use error::{Error, Result};
pub use geo::{BoundingSphere, Cartographic, Rectangle};
pub use heightmap::{ALL_CHILDREN, HeightmapOptions, HeightmapStructure, HeightmapTerrainData};
pub use mesh::{
    CreateMesh, HEIGHTMAP_TERRAIN_QUALITY, MAXIMUM_SKIRT_HEIGHT, MeshTask, TerrainMesh,
    estimated_level_zero_geometric_error_for_heightmap, skirt_height,
};
pub use terrain_data::TerrainData;
pub use tiling::{
    GeographicTilingScheme, TileCoord, TilingScheme, TilingSchemeKind, WebMercatorTilingScheme,
};
pub use worker::{MeshWorkerPool, Submission, TaskHandle, WorkerPool, WorkerPoolConfig};

// Re-export decode types for convenience.
pub use terrain_decode::{HeightBuffer, HeightCodec, SampleType};
