//! Heightmap terrain tile data.

use std::sync::Arc;

use serde::Deserialize;
use terrain_decode::{
    HEIGHTMAP_HEIGHT_OFFSET, HEIGHTMAP_HEIGHT_SCALE, HEIGHTMAP_SIZE, HeightBuffer, HeightCodec,
    HeightGrid, HeightmapPayload,
};

use crate::ellipsoid::Ellipsoid;
use crate::error::{Error, Result};
use crate::geo::Rectangle;
use crate::mesh::{self, CreateMesh};
use crate::terrain_data::TerrainData;
use crate::tiling::{TileCoord, TilingScheme};
use crate::upsample;
use crate::worker::MeshWorkerPool;

/// Child tile mask with all four children present.
pub const ALL_CHILDREN: u8 = 0b1111;

/// How heights are stored in a heightmap buffer and converted to meters.
///
/// Every field missing from a deserialized descriptor takes its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeightmapStructure {
    /// Multiplier applied to the encoded height.
    pub height_scale: f64,
    /// Offset added after scaling, in meters.
    pub height_offset: f64,
    /// Number of buffer elements that make up one height.
    pub elements_per_height: usize,
    /// Number of buffer elements between consecutive heights.
    pub stride: usize,
    /// Radix of each element.
    pub element_multiplier: f64,
    /// Whether the first element of a height is the most significant.
    pub is_big_endian: bool,
    /// Lower bound for encoded heights produced by resampling.
    pub lowest_encoded_height: Option<f64>,
    /// Upper bound for encoded heights produced by resampling.
    pub highest_encoded_height: Option<f64>,
}

impl Default for HeightmapStructure {
    fn default() -> Self {
        Self {
            height_scale: 1.0,
            height_offset: 0.0,
            elements_per_height: 1,
            stride: 1,
            element_multiplier: 256.0,
            is_big_endian: false,
            lowest_encoded_height: None,
            highest_encoded_height: None,
        }
    }
}

impl HeightmapStructure {
    /// Structure of a quantized `heightmap-1.0` tile.
    #[must_use]
    pub fn quantized() -> Self {
        Self {
            height_scale: HEIGHTMAP_HEIGHT_SCALE,
            height_offset: HEIGHTMAP_HEIGHT_OFFSET,
            ..Self::default()
        }
    }

    /// Codec for reading and writing encoded heights.
    #[must_use]
    pub fn codec(&self) -> HeightCodec {
        HeightCodec::from(self)
    }

    /// Convert an encoded height to meters.
    #[must_use]
    pub fn to_meters(&self, encoded: f64) -> f64 {
        encoded * self.height_scale + self.height_offset
    }

    /// Clamp an encoded height to the configured bounds.
    #[must_use]
    pub fn clamp_encoded(&self, encoded: f64) -> f64 {
        let mut encoded = encoded;
        if let Some(lowest) = self.lowest_encoded_height {
            encoded = encoded.max(lowest);
        }
        if let Some(highest) = self.highest_encoded_height {
            encoded = encoded.min(highest);
        }
        encoded
    }
}

impl From<&HeightmapStructure> for HeightCodec {
    fn from(structure: &HeightmapStructure) -> Self {
        HeightCodec {
            elements_per_height: structure.elements_per_height,
            element_multiplier: structure.element_multiplier,
            stride: structure.stride,
            is_big_endian: structure.is_big_endian,
        }
    }
}

/// Optional settings for [`HeightmapTerrainData::new`].
#[derive(Debug, Clone, Default)]
pub struct HeightmapOptions {
    /// Which children have their own data. Defaults to [`ALL_CHILDREN`].
    pub child_tile_mask: Option<u8>,
    /// Sample layout. Defaults to [`HeightmapStructure::default`].
    pub structure: Option<Arc<HeightmapStructure>>,
    /// Water mask, either one byte for the whole tile or a full mask.
    pub water_mask: Option<Vec<u8>>,
    /// Whether the data was synthesized from an ancestor.
    pub created_by_upsampling: bool,
}

/// Height samples for one terrain tile.
///
/// Rows run from the northern edge to the southern edge, samples within a row
/// from west to east. The data is immutable once constructed.
#[derive(Debug, Clone)]
pub struct HeightmapTerrainData {
    buffer: Arc<HeightBuffer>,
    width: usize,
    height: usize,
    child_tile_mask: u8,
    structure: Arc<HeightmapStructure>,
    water_mask: Option<Vec<u8>>,
    created_by_upsampling: bool,
}

impl HeightmapTerrainData {
    /// Create tile data from raw samples.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is below two or if the buffer does
    /// not hold `width * height * stride` elements.
    pub fn new(
        buffer: impl Into<HeightBuffer>,
        width: usize,
        height: usize,
        options: HeightmapOptions,
    ) -> Result<Self> {
        let buffer = buffer.into();
        let structure = options
            .structure
            .unwrap_or_else(|| Arc::new(HeightmapStructure::default()));

        if width < 2 || height < 2 {
            return Err(Error::InvalidArgument {
                context: "heightmap dimensions",
                detail: format!("{width}x{height} is smaller than 2x2"),
            });
        }

        let expected = width * height * structure.stride;
        if buffer.len() != expected {
            return Err(Error::InvalidArgument {
                context: "heightmap buffer",
                detail: format!(
                    "expected {expected} elements for {width}x{height} with stride {}, got {}",
                    structure.stride,
                    buffer.len()
                ),
            });
        }

        Ok(Self {
            buffer: Arc::new(buffer),
            width,
            height,
            child_tile_mask: options.child_tile_mask.unwrap_or(ALL_CHILDREN),
            structure,
            water_mask: options.water_mask,
            created_by_upsampling: options.created_by_upsampling,
        })
    }

    /// Create tile data from a decoded `heightmap-1.0` payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not hold a full grid.
    pub fn from_payload(payload: HeightmapPayload) -> Result<Self> {
        Self::new(
            payload.heights,
            HEIGHTMAP_SIZE,
            HEIGHTMAP_SIZE,
            HeightmapOptions {
                child_tile_mask: Some(payload.child_tile_mask),
                structure: Some(Arc::new(HeightmapStructure::quantized())),
                water_mask: payload.water_mask,
                created_by_upsampling: false,
            },
        )
    }

    /// Decode a `heightmap-1.0` tile.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is malformed.
    pub fn from_heightmap_bytes(packed: &[u8]) -> Result<Self> {
        Self::from_payload(terrain_decode::unpack_heightmap(packed)?)
    }

    /// Tile data synthesized from an ancestor. Children are unknown.
    pub(crate) fn upsampled(
        buffer: HeightBuffer,
        width: usize,
        height: usize,
        structure: Arc<HeightmapStructure>,
    ) -> Self {
        debug_assert_eq!(buffer.len(), width * height * structure.stride);
        Self {
            buffer: Arc::new(buffer),
            width,
            height,
            child_tile_mask: 0,
            structure,
            water_mask: None,
            created_by_upsampling: true,
        }
    }

    /// Raw samples.
    #[must_use]
    pub fn buffer(&self) -> &HeightBuffer {
        &self.buffer
    }

    pub(crate) fn shared_buffer(&self) -> &Arc<HeightBuffer> {
        &self.buffer
    }

    /// Samples per row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Child availability flags (SW=1, SE=2, NW=4, NE=8).
    #[must_use]
    pub fn child_tile_mask(&self) -> u8 {
        self.child_tile_mask
    }

    /// Sample layout, shared with tiles upsampled from this one.
    #[must_use]
    pub fn structure(&self) -> &Arc<HeightmapStructure> {
        &self.structure
    }

    pub(crate) fn grid(&self) -> HeightGrid<'_> {
        HeightGrid::new(
            &self.buffer,
            self.width,
            self.height,
            self.structure.codec(),
        )
    }

    /// Check whether a child tile has its own data.
    ///
    /// `(child_x, child_y)` must be one of the four children of
    /// `(this_x, this_y)`. Any other coordinates select the southeast flag.
    #[must_use]
    pub fn is_child_available(&self, this_x: u32, this_y: u32, child_x: u32, child_y: u32) -> bool {
        // NW is bit 2; x selects the east column, y the south row.
        let mut bit = 2;
        if child_x != this_x * 2 {
            bit += 1;
        }
        if child_y != this_y * 2 {
            bit -= 2;
        }
        (self.child_tile_mask >> bit) & 1 != 0
    }
}

impl TerrainData for HeightmapTerrainData {
    fn create_mesh(
        &self,
        pool: &dyn MeshWorkerPool,
        ellipsoid: &Ellipsoid,
        tiling_scheme: &dyn TilingScheme,
        tile: TileCoord,
    ) -> CreateMesh {
        mesh::create_mesh(self, pool, ellipsoid, tiling_scheme, tile)
    }

    fn upsample(
        &self,
        tiling_scheme: &dyn TilingScheme,
        tile: TileCoord,
        descendant: TileCoord,
    ) -> Result<Self> {
        upsample::upsample(self, tiling_scheme, tile, descendant)
    }

    fn is_child_available(&self, this_x: u32, this_y: u32, child_x: u32, child_y: u32) -> bool {
        HeightmapTerrainData::is_child_available(self, this_x, this_y, child_x, child_y)
    }

    fn interpolate_height(&self, rectangle: &Rectangle, longitude: f64, latitude: f64) -> Option<f64> {
        if !rectangle.contains(longitude, latitude) {
            return None;
        }

        let from_west = (longitude - rectangle.west) * (self.width - 1) as f64 / rectangle.width();
        let from_south =
            (latitude - rectangle.south) * (self.height - 1) as f64 / rectangle.height();
        let encoded = self.grid().interpolate(from_west, from_south);
        Some(self.structure.to_meters(encoded))
    }

    fn water_mask(&self) -> Option<&[u8]> {
        self.water_mask.as_deref()
    }

    fn was_created_by_upsampling(&self) -> bool {
        self.created_by_upsampling
    }
}
