//! Stitching of multiple region files into one height buffer.
//!
//! The buffer is allocated once for the bounding rectangle of all regions
//! named on the command line and initialised with 0 (no data). Chunks are
//! not stored in row order, so every point is written by random access.
//!
//! Alongside the buffer the bounds of visited chunks are tracked per chunk.
//! Regions may be sparsely generated, so these bounds are usually tighter
//! than the buffer and are used to crop the final raster.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::coords::{self, REGION_HEIGHT, REGION_WIDTH};
use crate::error::{Error, FormatError, Result};
use crate::ground::Ground;
use crate::region::{self, Bounds, RegionPos};

/// Height buffer anchored at a cartesian top left corner.
///
/// Row 1 is the northernmost row, column 1 the westernmost column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    origin_x: i64,
    origin_y: i64,
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Canvas {
    /// Zero-filled canvas.
    pub fn new(origin_x: i64, origin_y: i64, width: usize, height: usize) -> Self {
        Self {
            origin_x,
            origin_y,
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Zero-filled canvas, failing instead of aborting when the buffer
    /// cannot be allocated.
    pub fn try_new(origin_x: i64, origin_y: i64, width: usize, height: usize) -> Result<Self> {
        let too_large = || Error::CanvasTooLarge {
            width: width as u64,
            height: height as u64,
        };

        let len = width.checked_mul(height).ok_or_else(too_large)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| too_large())?;
        data.resize(len, 0);

        Ok(Self {
            origin_x,
            origin_y,
            width,
            height,
            data,
        })
    }

    /// Canvas covering exactly one region.
    pub fn for_region(pos: RegionPos) -> Self {
        let (origin_x, origin_y) = pos.origin();
        Self::new(
            origin_x,
            origin_y,
            REGION_WIDTH as usize,
            REGION_HEIGHT as usize,
        )
    }

    pub fn origin(&self) -> (i64, i64) {
        (self.origin_x, self.origin_y)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Buffer index of a cartesian point, if it lies on the canvas.
    pub fn index_of(&self, x: i64, y: i64) -> Option<usize> {
        let row = self.origin_y - y + 1;
        let col = x - self.origin_x + 1;
        if row < 1 || col < 1 || row > self.height as i64 || col > self.width as i64 {
            return None;
        }
        Some(coords::row_col_index(row, col, self.width as i64) as usize)
    }

    pub fn get(&self, x: i64, y: i64) -> Option<u8> {
        self.index_of(x, y).map(|index| self.data[index])
    }

    /// Writes a height at a cartesian point.
    pub fn put(&mut self, x: i64, y: i64, height: u8) -> Result<()> {
        let index = self.index_of(x, y).ok_or_else(|| Error::IndexOutOfRange {
            index: coords::row_col_index(
                self.origin_y - y + 1,
                x - self.origin_x + 1,
                self.width as i64,
            ),
            len: self.data.len(),
        })?;
        self.data[index] = height;
        Ok(())
    }

    /// Samples of a 1-based row between two 1-based columns, inclusive.
    pub fn row_span(&self, row: usize, first_col: usize, last_col: usize) -> &[u8] {
        let start = coords::row_col_index(row as i64, first_col as i64, self.width as i64) as usize;
        &self.data[start..start + (last_col - first_col + 1)]
    }

    /// Copies another canvas onto this one at its cartesian position.
    pub fn blit(&mut self, other: &Canvas) -> Result<()> {
        if other.width == 0 || other.height == 0 {
            return Ok(());
        }

        let last_x = other.origin_x + other.width as i64 - 1;
        let last_y = other.origin_y - (other.height as i64 - 1);

        let start = self.index_of(other.origin_x, other.origin_y);
        let end = self.index_of(last_x, last_y);
        let (Some(_), Some(_)) = (start, end) else {
            return Err(Error::IndexOutOfRange {
                index: coords::row_col_index(
                    self.origin_y - last_y + 1,
                    last_x - self.origin_x + 1,
                    self.width as i64,
                ),
                len: self.data.len(),
            });
        };

        for (row, line) in other.data.chunks_exact(other.width).enumerate() {
            let y = other.origin_y - row as i64;
            let index = self
                .index_of(other.origin_x, y)
                .ok_or_else(|| Error::IndexOutOfRange {
                    index: coords::row_col_index(
                        self.origin_y - y + 1,
                        other.origin_x - self.origin_x + 1,
                        self.width as i64,
                    ),
                    len: self.data.len(),
                })?;
            self.data[index..index + other.width].copy_from_slice(line);
        }
        Ok(())
    }
}

/// Result of parsing a set of region files.
#[derive(Debug)]
pub struct World {
    pub canvas: Canvas,
    /// Bounds of all visited chunks.
    pub bounds: Bounds,
}

/// Options controlling world assembly.
#[derive(Debug, Clone, Copy)]
pub struct WorldOptions {
    /// Worker threads for region parsing. 1 parses sequentially in input order.
    pub jobs: usize,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

/// Parses all region files into one canvas.
///
/// Region positions come from the file names only, and every chunk must lie
/// inside the region its file is named after. Any failure aborts the whole
/// run.
pub fn parse_world<P, G>(paths: &[P], ground: &G, options: WorldOptions) -> Result<World>
where
    P: AsRef<Path> + Sync,
    G: Ground + ?Sized,
{
    let regions = paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            RegionPos::from_path(path)
                .map(|pos| (path.to_path_buf(), pos))
                .map_err(|e| Error::from(e).in_region(path))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut canvas = allocate(&regions)?;
    let mut bounds = Bounds::EMPTY;

    log::info!(
        "Allocated {}x{} canvas at ({}, {}) for {} region files",
        canvas.width(),
        canvas.height(),
        canvas.origin_x,
        canvas.origin_y,
        regions.len()
    );

    if options.jobs <= 1 {
        for (path, pos) in &regions {
            let region_bounds =
                parse_region_file(path, *pos, ground, |x, y, h| canvas.put(x, y, h))
                    .map_err(|e| e.in_region(path))?;
            bounds.union(&region_bounds);
        }
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()
            .map_err(|e| Error::Config(format!("could not start worker threads: {}", e)))?;

        let tiles = pool.install(|| {
            regions
                .par_iter()
                .map(|(path, pos)| {
                    let mut tile = Canvas::for_region(*pos);
                    let tile_bounds =
                        parse_region_file(path, *pos, ground, |x, y, h| tile.put(x, y, h))
                            .map_err(|e| e.in_region(path))?;
                    Ok((tile, tile_bounds))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        for (tile, tile_bounds) in &tiles {
            canvas.blit(tile)?;
            bounds.union(tile_bounds);
        }
    }

    Ok(World { canvas, bounds })
}

/// Canvas covering the bounding rectangle of all regions.
fn allocate(regions: &[(PathBuf, RegionPos)]) -> Result<Canvas> {
    let Some(first) = regions.first().map(|(_, pos)| *pos) else {
        return Ok(Canvas::new(0, 0, 0, 0));
    };

    let (min, max) = regions
        .iter()
        .fold((first, first), |(min, max), (_, pos)| {
            (
                RegionPos::new(min.x.min(pos.x), min.z.min(pos.z)),
                RegionPos::new(max.x.max(pos.x), max.z.max(pos.z)),
            )
        });

    let (origin_x, origin_y) = min.origin();
    let width = (max.x as i64 - min.x as i64 + 1) * REGION_WIDTH;
    let height = (max.z as i64 - min.z as i64 + 1) * REGION_HEIGHT;

    Canvas::try_new(origin_x, origin_y, width as usize, height as usize)
}

fn parse_region_file<G, F>(path: &Path, pos: RegionPos, ground: &G, mut sink: F) -> Result<Bounds>
where
    G: Ground + ?Sized,
    F: FnMut(i64, i64, u8) -> Result<()>,
{
    let data = fs::read(path).map_err(|e| Error::io(path, e))?;
    log::info!(
        "Parsing region ({}, {}) from {} ({} bytes)",
        pos.x,
        pos.z,
        path.display(),
        data.len()
    );

    region::parse_region(&data, ground, |x, y, height| {
        if !pos.contains(x, y) {
            return Err(FormatError::ChunkOutsideRegion {
                chunk_x: x.div_euclid(coords::CHUNK_WIDTH),
                chunk_z: (-y).div_euclid(coords::CHUNK_WIDTH),
                region_x: pos.x,
                region_z: pos.z,
            }
            .into());
        }
        sink(x, y, height)
    })
}
