//! Regular grid triangulation.

/// Build triangle list indices for a `width` x `height` vertex grid stored
/// row by row from the north.
///
/// Each cell is split along its southwest-northeast diagonal into two
/// counter-clockwise triangles (viewed from above).
#[must_use]
pub fn grid_indices(width: usize, height: usize) -> Vec<u32> {
    if width < 2 || height < 2 {
        return Vec::new();
    }

    let mut indices = Vec::with_capacity((width - 1) * (height - 1) * 6);
    for row in 0..height - 1 {
        for column in 0..width - 1 {
            let upper_left = (row * width + column) as u32;
            let lower_left = upper_left + width as u32;
            let lower_right = lower_left + 1;
            let upper_right = upper_left + 1;

            indices.extend_from_slice(&[
                upper_left,
                lower_left,
                upper_right,
                upper_right,
                lower_left,
                lower_right,
            ]);
        }
    }

    indices
}
