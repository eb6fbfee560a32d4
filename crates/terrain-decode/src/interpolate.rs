//! Lattice-space height interpolation.

use crate::buffer::HeightBuffer;
use crate::codec::HeightCodec;

/// Interpolate within one grid cell split along its southwest-northeast
/// diagonal.
///
/// `dx` grows eastward and `dy` northward, both in `[0, 1]`. The split must
/// match the diagonal chosen by the regular-grid triangulation so that a
/// resampled heightmap lies exactly on the mesh built from its parent.
#[must_use]
pub fn triangle_interpolate_height(
    dx: f64,
    dy: f64,
    southwest: f64,
    southeast: f64,
    northwest: f64,
    northeast: f64,
) -> f64 {
    if dy < dx {
        // Lower right triangle.
        southwest + dx * (southeast - southwest) + dy * (northeast - southeast)
    } else {
        // Upper left triangle.
        southwest + dx * (northeast - northwest) + dy * (northwest - southwest)
    }
}

/// A read-only view of a heightmap's samples.
///
/// Row 0 is the northern edge of the tile, column 0 the western edge.
#[derive(Debug, Clone, Copy)]
pub struct HeightGrid<'a> {
    buffer: &'a HeightBuffer,
    width: usize,
    height: usize,
    codec: HeightCodec,
}

impl<'a> HeightGrid<'a> {
    /// Create a view over `buffer` holding `width * height` samples.
    #[must_use]
    pub fn new(buffer: &'a HeightBuffer, width: usize, height: usize, codec: HeightCodec) -> Self {
        debug_assert!(width >= 2 && height >= 2);
        debug_assert_eq!(buffer.len(), width * height * codec.stride);
        Self {
            buffer,
            width,
            height,
            codec,
        }
    }

    /// Number of samples per row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Encoded height at `row` (from the north) and `column` (from the west).
    #[must_use]
    pub fn sample(&self, row: usize, column: usize) -> f64 {
        self.codec.decode(self.buffer, row * self.width + column)
    }

    /// Encoded height at a fractional lattice position.
    ///
    /// `from_west` is measured in columns from the western edge and
    /// `from_south` in rows from the southern edge. Positions on the eastern
    /// or northern edge use the last cell.
    #[must_use]
    pub fn interpolate(&self, from_west: f64, from_south: f64) -> f64 {
        let mut west = from_west as usize;
        let mut east = west + 1;
        if east >= self.width {
            east = self.width - 1;
            west = self.width - 2;
        }

        let mut south = from_south as usize;
        let mut north = south + 1;
        if north >= self.height {
            north = self.height - 1;
            south = self.height - 2;
        }

        let dx = from_west - west as f64;
        let dy = from_south - south as f64;

        // Buffer rows run from the north.
        let south_row = self.height - 1 - south;
        let north_row = self.height - 1 - north;

        triangle_interpolate_height(
            dx,
            dy,
            self.sample(south_row, west),
            self.sample(south_row, east),
            self.sample(north_row, west),
            self.sample(north_row, east),
        )
    }
}
