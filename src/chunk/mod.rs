//! Chunk heightmap reduction.
//!
//! Reduces the 16x16xN voxel columns of a pre-1.13 Anvil chunk to one
//! height byte per column:
//! - Sections are visited in stored order
//! - Each section is scanned top to bottom
//! - The highest ground block of every column wins

use fastnbt::Value;

use crate::error::FormatError;
use crate::ground::Ground;

/// Number of columns in a chunk.
pub const CHUNK_COLUMNS: usize = 256;
/// Number of blocks in a section (16x16x16).
pub const SECTION_BLOCKS: usize = 4096;
/// Bytes per y-layer of a section's `Blocks` array.
const LAYER_STRIDE: usize = 256;

/// Heights of a single chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeights {
    /// Chunk x in chunk grid units.
    pub x: i32,
    /// Chunk z in chunk grid units.
    pub z: i32,
    /// Highest ground block per column, indexed by `z * 16 + x`. 0 means no data.
    pub heights: [u8; CHUNK_COLUMNS],
    /// Sections dropped by the ordering rule.
    pub skipped_sections: usize,
}

/// Computes the heightmap of a decoded chunk.
///
/// A section whose `Y` is not above every previously processed section of
/// the chunk is skipped. Out-of-order sections lose their data; existing
/// DEMs depend on this, so it is kept.
pub fn reduce_chunk<G>(root: &Value, ground: &G) -> Result<ChunkHeights, FormatError>
where
    G: Ground + ?Sized,
{
    let level = find(root, "Level", "Chunk")?;
    if !matches!(level, Value::Compound(_)) {
        return Err(wrong_type("Level", "Chunk", "TAG_COMPOUND"));
    }

    let x = get_int(level, "xPos")?;
    let z = get_int(level, "zPos")?;

    let sections = match find(level, "Sections", "Level")? {
        Value::List(sections) => sections,
        _ => return Err(wrong_type("Sections", "Level", "TAG_LIST")),
    };

    let mut heights = [0u8; CHUNK_COLUMNS];
    let mut last_section_y: i8 = -1;
    let mut skipped_sections = 0;

    for section in sections {
        if !matches!(section, Value::Compound(_)) {
            continue;
        }

        let section_y = match find(section, "Y", "Section")? {
            Value::Byte(y) => *y,
            _ => return Err(wrong_type("Y", "Section", "TAG_BYTE")),
        };

        if section_y <= last_section_y {
            skipped_sections += 1;
            continue;
        }
        last_section_y = section_y;

        let blocks = match find(section, "Blocks", "Section")? {
            Value::ByteArray(blocks) => blocks,
            _ => return Err(wrong_type("Blocks", "Section", "TAG_BYTE_ARRAY")),
        };

        if blocks.len() != SECTION_BLOCKS {
            return Err(FormatError::BlocksLength(blocks.len()));
        }
        if section_y > 15 {
            return Err(FormatError::SectionOutOfRange(section_y));
        }

        reduce_section(&mut heights, section_y as u8, blocks, ground);
    }

    if skipped_sections > 0 {
        log::debug!(
            "Chunk ({}, {}): skipped {} out-of-order sections",
            x,
            z,
            skipped_sections
        );
    }

    Ok(ChunkHeights {
        x,
        z,
        heights,
        skipped_sections,
    })
}

/// Raises column heights with the ground blocks of one section.
///
/// Blocks are laid out as `y * 256 + z * 16 + x`.
fn reduce_section<G>(
    heights: &mut [u8; CHUNK_COLUMNS],
    section_y: u8,
    blocks: &[i8],
    ground: &G,
) where
    G: Ground + ?Sized,
{
    for local_y in (0..16u8).rev() {
        let current_y = section_y * 16 + local_y;
        let layer = &blocks[local_y as usize * LAYER_STRIDE..][..LAYER_STRIDE];

        for (column, &block_id) in layer.iter().enumerate() {
            if heights[column] < current_y && ground.is_ground(block_id as u8) {
                heights[column] = current_y;
            }
        }
    }
}

fn find<'a>(
    compound: &'a Value,
    tag: &'static str,
    parent: &'static str,
) -> Result<&'a Value, FormatError> {
    match compound {
        Value::Compound(map) => map.get(tag).ok_or(FormatError::MissingTag { tag, parent }),
        _ => Err(wrong_type(parent, parent, "TAG_COMPOUND")),
    }
}

fn get_int(level: &Value, tag: &'static str) -> Result<i32, FormatError> {
    match find(level, tag, "Level")? {
        Value::Int(value) => Ok(*value),
        _ => Err(wrong_type(tag, "Level", "TAG_INT")),
    }
}

fn wrong_type(tag: &'static str, parent: &'static str, expected: &'static str) -> FormatError {
    FormatError::WrongTagType {
        tag,
        parent,
        expected,
    }
}
