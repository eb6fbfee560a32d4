//! Synthesizing child tile data from a parent heightmap.
//!
//! Grids with an odd number of posts along both axes share every other post
//! with their children, so a child is an exact sub-grid of its parent. Other
//! grids are resampled with the same triangle split the tessellator uses, so
//! the child's mesh lies on the parent's mesh.

use std::sync::Arc;

use terrain_decode::HeightBuffer;

use crate::error::{Error, Result};
use crate::heightmap::HeightmapTerrainData;
use crate::tiling::{TileCoord, TilingScheme};

pub(crate) fn upsample(
    data: &HeightmapTerrainData,
    tiling_scheme: &dyn TilingScheme,
    tile: TileCoord,
    descendant: TileCoord,
) -> Result<HeightmapTerrainData> {
    if descendant.level.checked_sub(tile.level) != Some(1) {
        return Err(Error::InvalidArgument {
            context: "upsample level difference",
            detail: format!(
                "can only upsample one level, from {} to {}",
                tile.level, descendant.level
            ),
        });
    }

    if data.width() % 2 == 1 && data.height() % 2 == 1 {
        tracing::debug!(?tile, ?descendant, "Upsampling heightmap by subsetting");
        subset(data, tile, descendant)
    } else {
        tracing::debug!(?tile, ?descendant, "Upsampling heightmap by interpolation");
        Ok(interpolate(data, tiling_scheme, tile, descendant))
    }
}

/// Index of the first post of `descendant_index`'s span within its parent's
/// lattice, or `None` when the descendant is not inside `this_index`.
fn parent_post(descendant_index: u32, this_index: u32, size: usize) -> Option<usize> {
    let intervals = size - 1;
    // One level down: the descendant's posts land on every other parent post.
    let post = descendant_index as usize * intervals / 2;
    let origin = this_index as usize * intervals;
    post.checked_sub(origin)
        .filter(|&post| post + intervals / 2 <= intervals)
}

fn subset(
    data: &HeightmapTerrainData,
    tile: TileCoord,
    descendant: TileCoord,
) -> Result<HeightmapTerrainData> {
    let width = data.width();
    let height = data.height();
    let stride = data.structure().stride;

    let (Some(left), Some(top)) = (
        parent_post(descendant.x, tile.x, width),
        parent_post(descendant.y, tile.y, height),
    ) else {
        return Err(Error::InvalidArgument {
            context: "upsample descendant",
            detail: format!("{descendant:?} is not a child of {tile:?}"),
        });
    };

    let upsampled_width = width.div_ceil(2);
    let upsampled_height = height.div_ceil(2);
    let buffer = data.buffer().gather((top..top + upsampled_height).map(|row| {
        let start = (row * width + left) * stride;
        start..start + upsampled_width * stride
    }));

    Ok(HeightmapTerrainData::upsampled(
        buffer,
        upsampled_width,
        upsampled_height,
        Arc::clone(data.structure()),
    ))
}

fn lerp(start: f64, end: f64, t: f64) -> f64 {
    (1.0 - t) * start + t * end
}

fn interpolate(
    data: &HeightmapTerrainData,
    tiling_scheme: &dyn TilingScheme,
    tile: TileCoord,
    descendant: TileCoord,
) -> HeightmapTerrainData {
    let width = data.width();
    let height = data.height();
    let structure = data.structure();
    let codec = structure.codec();
    let grid = data.grid();

    let source = tiling_scheme.tile_xy_to_rectangle(tile.x, tile.y, tile.level);
    let destination =
        tiling_scheme.tile_xy_to_rectangle(descendant.x, descendant.y, descendant.level);

    let last_column = (width - 1) as f64;
    let last_row = (height - 1) as f64;

    let mut heights = HeightBuffer::zeroed(
        data.buffer().sample_type(),
        width * height * structure.stride,
    );
    for j in 0..height {
        let latitude = lerp(destination.north, destination.south, j as f64 / last_row);
        let from_south = (latitude - source.south) * last_row / source.height();
        for i in 0..width {
            let longitude = lerp(destination.west, destination.east, i as f64 / last_column);
            let from_west = (longitude - source.west) * last_column / source.width();

            let sample = structure.clamp_encoded(grid.interpolate(from_west, from_south));
            codec.encode(&mut heights, j * width + i, sample);
        }
    }

    HeightmapTerrainData::upsampled(heights, width, height, Arc::clone(structure))
}
