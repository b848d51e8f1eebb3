//! Conversions between block, chunk and region coordinate spaces.
//!
//! All coordinates here are cartesian: x grows east, y grows north.
//! Minecraft's z axis grows south, so `y = -z`.
//!
//! The region helpers bin cartesian space into 512x512 cells. They are not
//! Minecraft region indices: with `y = -z`, the blocks of Minecraft region
//! `z` fall mostly in cartesian cell `-z - 1`. Region files are placed with
//! [`crate::region::RegionPos::origin`].

/// Width of a region in blocks.
pub const REGION_WIDTH: i64 = 512;
/// Height of a region in blocks.
pub const REGION_HEIGHT: i64 = 512;
/// Width and depth of a chunk in blocks.
pub const CHUNK_WIDTH: i64 = 16;

/// Inclusive rectangle in cartesian block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBounds {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

/// Region containing the given block.
///
/// Uses floor division, so block `-1` lies in region `-1`.
#[inline]
pub fn region_of(x: i64, y: i64) -> (i64, i64) {
    (x.div_euclid(REGION_WIDTH), y.div_euclid(REGION_HEIGHT))
}

/// Blocks covered by a region.
#[inline]
pub fn region_bounds(region_x: i64, region_y: i64) -> RegionBounds {
    let min_x = region_x * REGION_WIDTH;
    let min_y = region_y * REGION_HEIGHT;

    RegionBounds {
        min_x,
        max_x: min_x + REGION_WIDTH - 1,
        min_y,
        max_y: min_y + REGION_HEIGHT - 1,
    }
}

/// Top left block of a region, the anchor for row/column indexing.
#[inline]
pub fn region_origin_topleft(region_x: i64, region_y: i64) -> (i64, i64) {
    let bounds = region_bounds(region_x, region_y);
    (bounds.min_x, bounds.max_y)
}

/// Linear buffer index of a 1-based row and column.
#[inline]
pub fn row_col_index(row: i64, col: i64, width: i64) -> i64 {
    (row - 1) * width + (col - 1)
}

/// Cartesian position of a column inside a chunk.
///
/// `column` is the chunk-local index `z * 16 + x`.
#[inline]
pub fn column_to_cartesian(chunk_x: i32, chunk_z: i32, column: usize) -> (i64, i64) {
    let column = column as i64;
    let x = chunk_x as i64 * CHUNK_WIDTH + column % CHUNK_WIDTH;
    let z = chunk_z as i64 * CHUNK_WIDTH + column / CHUNK_WIDTH;
    (x, -z)
}
