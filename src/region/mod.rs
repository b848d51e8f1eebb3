//! Minecraft Anvil region file format (.mca).
//!
//! Region files contain 32x32 chunks in a specific binary format:
//! - Bytes 0-4095: Location table (1024 entries × 4 bytes)
//! - Bytes 4096-8191: Timestamp table (unused here)
//! - Bytes 8192+: Chunk payloads (`[length:4][scheme:1][compressed NBT]`)

mod header;

pub use header::{ChunkLocation, decode_entry, locations};

use std::io::Read;
use std::path::Path;

use fastnbt::Value;
use flate2::read::ZlibDecoder;

use crate::chunk;
use crate::coords::{self, REGION_HEIGHT, REGION_WIDTH};
use crate::error::{FormatError, Result};
use crate::ground::Ground;

/// Size of one sector in bytes (4 KB).
pub const SECTOR_SIZE: usize = 4096;

/// Size of the location table, the minimum size of a region file.
pub const LOCATION_TABLE_SIZE: usize = SECTOR_SIZE;

/// Number of chunks in a region.
pub const CHUNKS_PER_REGION: usize = 1024;

/// Zlib compression scheme id, the only one supported.
pub const ZLIB: u8 = 2;

/// Region file coordinates (parsed from filename like "r.0.-1.mca").
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Parse region position from filename (e.g., "r.0.-1.mca").
    pub fn from_filename(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() == 4 && parts[0] == "r" && parts[3] == "mca" {
            let x = parts[1].parse().ok()?;
            let z = parts[2].parse().ok()?;
            Some(Self { x, z })
        } else {
            None
        }
    }

    /// Parse region position from the file name component of a path.
    pub fn from_path(path: &Path) -> std::result::Result<Self, FormatError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        Self::from_filename(&name).ok_or_else(|| FormatError::RegionFileName(name.into_owned()))
    }

    /// Cartesian coordinates of the region's top left block.
    pub fn origin(&self) -> (i64, i64) {
        (
            self.x as i64 * REGION_WIDTH,
            -(self.z as i64 * REGION_HEIGHT),
        )
    }

    /// Whether a cartesian block lies inside this region.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        let (origin_x, origin_y) = self.origin();
        (origin_x..origin_x + REGION_WIDTH).contains(&x)
            && (origin_y - REGION_HEIGHT + 1..=origin_y).contains(&y)
    }
}

/// Inclusive cartesian rectangle covered by visited chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub max_x: i64,
    pub min_x: i64,
    pub max_y: i64,
    pub min_y: i64,
}

impl Bounds {
    /// Bounds before any chunk was visited.
    pub const EMPTY: Bounds = Bounds {
        max_x: i64::MIN,
        min_x: i64::MAX,
        max_y: i64::MIN,
        min_y: i64::MAX,
    };

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Grows the bounds to the 16x16 footprint of a chunk.
    pub fn expand_chunk(&mut self, chunk_x: i32, chunk_z: i32) {
        let (min_x, max_y) = coords::column_to_cartesian(chunk_x, chunk_z, 0);
        let (max_x, min_y) =
            coords::column_to_cartesian(chunk_x, chunk_z, chunk::CHUNK_COLUMNS - 1);

        self.union(&Bounds {
            max_x,
            min_x,
            max_y,
            min_y,
        });
    }

    pub fn union(&mut self, other: &Bounds) {
        self.max_x = self.max_x.max(other.max_x);
        self.min_x = self.min_x.min(other.min_x);
        self.max_y = self.max_y.max(other.max_y);
        self.min_y = self.min_y.min(other.min_y);
    }

    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max_x - self.min_x + 1) as usize
        }
    }

    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max_y - self.min_y + 1) as usize
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Parses a whole region file, emitting one height per block column.
///
/// Chunks are processed in header slot order, so `sink` receives points in
/// no particular spatial order. Returns the bounds of all visited chunks,
/// including chunks without any ground.
pub fn parse_region<G, F>(data: &[u8], ground: &G, mut sink: F) -> Result<Bounds>
where
    G: Ground + ?Sized,
    F: FnMut(i64, i64, u8) -> Result<()>,
{
    if data.len() < LOCATION_TABLE_SIZE {
        return Err(FormatError::TruncatedHeader { size: data.len() }.into());
    }

    let mut bounds = Bounds::EMPTY;
    let mut chunk_count = 0;

    for location in locations(data) {
        if location.is_empty() {
            continue;
        }

        let nbt = read_chunk(data, location.offset)?;
        let heights = chunk::reduce_chunk(&nbt, ground)?;

        for (column, &height) in heights.heights.iter().enumerate() {
            let (x, y) = coords::column_to_cartesian(heights.x, heights.z, column);
            sink(x, y, height)?;
        }

        bounds.expand_chunk(heights.x, heights.z);
        chunk_count += 1;
    }

    log::debug!("Parsed {} chunks, bounds {:?}", chunk_count, bounds);

    Ok(bounds)
}

/// Locates, decompresses and decodes the chunk payload at `offset`.
pub fn read_chunk(data: &[u8], offset: usize) -> std::result::Result<Value, FormatError> {
    let size = data.len();
    if offset >= size {
        return Err(FormatError::OffsetOutOfRange { offset, size });
    }

    let payload = &data[offset..];
    if payload.len() < 5 {
        return Err(FormatError::TruncatedPayload {
            offset,
            length: 5,
            size,
        });
    }

    let length = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let compression_scheme = payload[4];
    if compression_scheme != ZLIB {
        return Err(FormatError::UnsupportedCompression(compression_scheme));
    }

    // Length includes the scheme byte.
    let body_len = (length as usize).saturating_sub(1);
    let compressed = payload[5..]
        .get(..body_len)
        .ok_or(FormatError::TruncatedPayload {
            offset,
            length,
            size,
        })?;

    let mut decoder = ZlibDecoder::new(compressed);
    let mut nbt = Vec::new();
    decoder
        .read_to_end(&mut nbt)
        .map_err(FormatError::Decompress)?;

    Ok(fastnbt::from_bytes(&nbt)?)
}
