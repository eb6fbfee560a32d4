//! Decode and resample packed heightmap samples for quadtree terrain tiles.
//!
//! This crate provides pure synchronous functions for reading, writing and
//! interpolating the raw samples of a heightmap tile. It knows nothing about
//! geography: positions are expressed in lattice space (rows and columns).
//! All functions can be called from any threading context - the library user
//! controls parallelism.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Type-preserving**: Samples stay in the element type they arrived in
//! - **Bit-exact**: Packing rules match the terrain provider encodings

mod buffer;
mod codec;
mod error;
mod indices;
mod interpolate;
mod payload;

pub use buffer::{HeightBuffer, SampleType};
pub use codec::HeightCodec;
pub use error::{DecodeError, DecodeResult};
pub use indices::grid_indices;
pub use interpolate::{HeightGrid, triangle_interpolate_height};
pub use payload::{
    HEIGHTMAP_HEIGHT_OFFSET, HEIGHTMAP_HEIGHT_SCALE, HEIGHTMAP_SIZE, HeightmapPayload,
    WATER_MASK_SIZE, unpack_heightmap,
};
