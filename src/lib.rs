//! anvil2dem: generate a DEM from Minecraft Anvil region files.
//!
//! Reads pre-1.13 region files (.mca), reduces every block column to the
//! height of its topmost ground block and writes the result as a
//! georeferenced 8-bit GeoTIFF.
//!
//! Pipeline:
//! - [`world::parse_world`] reads each `r.<X>.<Z>.mca` file
//! - [`region::parse_region`] walks the chunk location table
//! - [`chunk::reduce_chunk`] turns a chunk into 256 column heights
//! - [`raster::write_raster`] crops and encodes the stitched buffer
//!
//! Coordinates are cartesian: x grows east and y grows north (`y = -z`).

pub mod chunk;
pub mod coords;
pub mod error;
pub mod ground;
pub mod raster;
pub mod region;
pub mod world;

#[cfg(test)]
mod fixtures;

pub use error::{Error, FormatError, Result};
pub use ground::{Ground, GroundClassifier};
pub use raster::{CompressionScheme, write_raster};
pub use region::{Bounds, RegionPos, parse_region};
pub use world::{Canvas, World, WorldOptions, parse_world};
