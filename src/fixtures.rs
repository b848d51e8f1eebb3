//! Builders for synthetic chunks and region files used by tests.

use std::io::Write;

use fastnbt::{ByteArray, Value};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use serde::Serialize;

use crate::region::{SECTOR_SIZE, ZLIB};

#[derive(Serialize)]
struct ChunkNbt {
    #[serde(rename = "Level")]
    level: LevelNbt,
}

#[derive(Serialize)]
struct LevelNbt {
    #[serde(rename = "xPos")]
    x_pos: i32,
    #[serde(rename = "zPos")]
    z_pos: i32,
    #[serde(rename = "Sections")]
    sections: Vec<SectionNbt>,
}

#[derive(Serialize)]
struct SectionNbt {
    #[serde(rename = "Y")]
    y: i8,
    #[serde(rename = "Blocks")]
    blocks: ByteArray,
}

/// Index of a block inside a section's `Blocks` array.
pub fn block_index(x: usize, y: usize, z: usize) -> usize {
    y * 256 + z * 16 + x
}

pub fn air_section() -> Vec<u8> {
    vec![0; 4096]
}

/// Section whose bottom layer is solid.
pub fn filled_section(y: usize) -> Vec<u8> {
    let mut blocks = air_section();
    for column in 0..256 {
        blocks[y * 256 + column] = 1;
    }
    blocks
}

pub struct ChunkBuilder {
    x: i32,
    z: i32,
    sections: Vec<SectionNbt>,
}

impl ChunkBuilder {
    pub fn new(x: i32, z: i32) -> Self {
        Self {
            x,
            z,
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, y: i8, blocks: Vec<u8>) -> Self {
        let blocks = blocks.into_iter().map(|b| b as i8).collect();
        self.sections.push(SectionNbt {
            y,
            blocks: ByteArray::new(blocks),
        });
        self
    }

    pub fn nbt(self) -> Vec<u8> {
        let chunk = ChunkNbt {
            level: LevelNbt {
                x_pos: self.x,
                z_pos: self.z,
                sections: self.sections,
            },
        };
        fastnbt::to_bytes(&chunk).unwrap()
    }

    pub fn value(self) -> Value {
        fastnbt::from_bytes(&self.nbt()).unwrap()
    }

    /// Chunk packed as `[length:4][scheme:1][zlib data]`.
    pub fn payload(self) -> Vec<u8> {
        wrap_payload(&self.nbt(), ZLIB)
    }
}

pub fn wrap_payload(nbt: &[u8], scheme: u8) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(nbt).unwrap();
    let compressed = encoder.finish().unwrap();

    let mut payload = Vec::with_capacity(5 + compressed.len());
    payload.extend_from_slice(&(compressed.len() as u32 + 1).to_be_bytes());
    payload.push(scheme);
    payload.extend_from_slice(&compressed);
    payload
}

/// In-memory region file.
pub struct RegionBuilder {
    chunks: Vec<(usize, Vec<u8>)>,
}

impl RegionBuilder {
    pub fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    /// Puts a payload into the header slot of local chunk (x, z).
    pub fn chunk(mut self, local_x: usize, local_z: usize, payload: Vec<u8>) -> Self {
        self.chunks.push((local_z * 32 + local_x, payload));
        self
    }

    pub fn build(self) -> Vec<u8> {
        // Location table and timestamp table.
        let mut data = vec![0u8; SECTOR_SIZE * 2];

        for (slot, payload) in self.chunks {
            let sector = (data.len() / SECTOR_SIZE) as u32;
            let sectors = payload.len().div_ceil(SECTOR_SIZE) as u8;

            let entry = slot * 4;
            data[entry..entry + 3].copy_from_slice(&sector.to_be_bytes()[1..]);
            data[entry + 3] = sectors;

            data.extend_from_slice(&payload);
            data.resize((sector as usize + sectors as usize) * SECTOR_SIZE, 0);
        }

        data
    }
}

/// Region where every chunk has a solid layer at `height`.
pub fn flat_region(region_x: i32, region_z: i32, height: u8) -> Vec<u8> {
    let section_y = (height / 16) as i8;
    let blocks = filled_section((height % 16) as usize);

    let mut builder = RegionBuilder::new();
    for local_z in 0..32 {
        for local_x in 0..32 {
            let payload = ChunkBuilder::new(
                region_x * 32 + local_x as i32,
                region_z * 32 + local_z as i32,
            )
            .section(section_y, blocks.clone())
            .payload();
            builder = builder.chunk(local_x, local_z, payload);
        }
    }
    builder.build()
}
