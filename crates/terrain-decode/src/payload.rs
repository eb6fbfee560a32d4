//! Quantized heightmap tile payloads.
//!
//! A `heightmap-1.0` tile is a 65x65 grid of little-endian `u16` heights
//! (row 0 north), followed by one byte of child availability flags and an
//! optional water mask: either a single byte (the whole tile is land or
//! water) or a 256x256 byte mask.

use crate::buffer::{HeightBuffer, SampleType};
use crate::error::{DecodeError, DecodeResult};

/// Number of posts along each edge of a quantized heightmap tile.
pub const HEIGHTMAP_SIZE: usize = 65;

/// Edge length of a full water mask in bytes.
pub const WATER_MASK_SIZE: usize = 256;

/// Height scale applied to quantized samples (one unit is 20 cm).
pub const HEIGHTMAP_HEIGHT_SCALE: f64 = 1.0 / 5.0;

/// Height offset applied after scaling, in meters.
pub const HEIGHTMAP_HEIGHT_OFFSET: f64 = -1000.0;

/// The decoded content of a quantized heightmap tile.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightmapPayload {
    /// `HEIGHTMAP_SIZE * HEIGHTMAP_SIZE` quantized heights.
    pub heights: HeightBuffer,
    /// Child availability flags (SW=1, SE=2, NW=4, NE=8).
    pub child_tile_mask: u8,
    /// Water mask, when the tile carries one.
    pub water_mask: Option<Vec<u8>>,
}

/// Unpack a `heightmap-1.0` tile.
///
/// # Errors
///
/// Returns an error if the payload is shorter than the heights plus the child
/// mask, or if the trailing water mask has an unexpected size.
pub fn unpack_heightmap(packed: &[u8]) -> DecodeResult<HeightmapPayload> {
    let heights_len = HEIGHTMAP_SIZE * HEIGHTMAP_SIZE * SampleType::U16.size();
    let expected = heights_len + 1;
    if packed.len() < expected {
        return Err(DecodeError::BufferTooSmall {
            expected,
            actual: packed.len(),
        });
    }

    let heights = HeightBuffer::from_le_bytes(SampleType::U16, &packed[..heights_len])?;
    let child_tile_mask = packed[heights_len];

    let water_mask = &packed[expected..];
    let water_mask = match water_mask.len() {
        0 => None,
        1 => Some(water_mask.to_vec()),
        len if len == WATER_MASK_SIZE * WATER_MASK_SIZE => Some(water_mask.to_vec()),
        len => {
            return Err(DecodeError::InvalidFormat {
                context: "heightmap water mask",
                detail: format!(
                    "expected 1 or {} bytes, got {len}",
                    WATER_MASK_SIZE * WATER_MASK_SIZE
                ),
            });
        }
    };

    Ok(HeightmapPayload {
        heights,
        child_tile_mask,
        water_mask,
    })
}
