//! Error types for DEM generation.
//!
//! Every failure is fatal to a run: nothing is retried and no partial
//! raster is produced.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Possible errors while generating a DEM.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad command line or block list, detected before any region is read.
    #[error("configuration error: {0}")]
    Config(String),

    /// Region file or chunk data does not follow the Anvil format.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// File could not be opened, read or written.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A point mapped outside the image buffer.
    ///
    /// This should not occur under normal conditions.
    #[error("calculated index {index} exceeds image buffer size ({len} bytes)")]
    IndexOutOfRange { index: i64, len: usize },

    /// The regions named on the command line span more blocks than can be
    /// held in memory.
    #[error("could not allocate a {width}x{height} image buffer")]
    CanvasTooLarge { width: u64, height: u64 },

    /// None of the region files contained a generated chunk.
    #[error("no generated chunks found, nothing to write")]
    EmptyWorld,

    /// Error raised by the TIFF encoder.
    #[error("failed to encode raster: {0}")]
    Raster(#[from] tiff::TiffError),

    /// Any error raised while processing a specific region file.
    #[error("{}: {source}", path.display())]
    Region {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Attaches the region file that was being processed.
    pub(crate) fn in_region(self, path: impl Into<PathBuf>) -> Self {
        Error::Region {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

/// Malformed input detected while parsing a region file or chunk.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("region file is {size} bytes, expected at least 4096; this could indicate a corrupt region file")]
    TruncatedHeader { size: usize },

    #[error("corrupt file: chunk offset {offset} is past the end of the file ({size} bytes)")]
    OffsetOutOfRange { offset: usize, size: usize },

    #[error("corrupt file: chunk at offset {offset} declares {length} bytes but the file is {size} bytes")]
    TruncatedPayload {
        offset: usize,
        length: u32,
        size: usize,
    },

    /// Only zlib (2) is supported.
    #[error("unsupported chunk compression scheme ({0})")]
    UnsupportedCompression(u8),

    #[error("could not decompress chunk: {0}")]
    Decompress(#[source] io::Error),

    #[error("could not parse chunk NBT: {0}")]
    Nbt(#[from] fastnbt::error::Error),

    #[error("could not find '{tag}' tag in '{parent}' compound")]
    MissingTag {
        tag: &'static str,
        parent: &'static str,
    },

    #[error("'{tag}' tag in '{parent}' compound is not of type {expected}")]
    WrongTagType {
        tag: &'static str,
        parent: &'static str,
        expected: &'static str,
    },

    #[error("'Blocks' byte array length is {0}, expected 4096")]
    BlocksLength(usize),

    /// Heights are stored in one byte, so sections above 15 cannot be represented.
    #[error("section Y {0} is outside of 0..=15")]
    SectionOutOfRange(i8),

    /// A chunk stored in a file named after a different region.
    #[error("chunk ({chunk_x}, {chunk_z}) does not belong to region ({region_x}, {region_z})")]
    ChunkOutsideRegion {
        chunk_x: i64,
        chunk_z: i64,
        region_x: i32,
        region_z: i32,
    },

    #[error("failed to parse region file name '{0}', expected r.<X>.<Z>.mca")]
    RegionFileName(String),
}
