//! Ground classification of block ids.
//!
//! Decides which blocks count towards the height of a column. Excluding
//! leaves (18, 161) and logs (17, 162) for example removes trees from the DEM.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Air.
pub const AIR: u8 = 0;

/// Decides whether a block counts towards column height.
///
/// Called once per voxel, so implementations must be cheap.
pub trait Ground: Sync {
    fn is_ground(&self, block_id: u8) -> bool;
}

impl<F> Ground for F
where
    F: Fn(u8) -> bool + Sync,
{
    fn is_ground(&self, block_id: u8) -> bool {
        self(block_id)
    }
}

/// Lookup table classifier built from an allow or deny list.
#[derive(Clone)]
pub struct GroundClassifier {
    ground: [bool; 256],
}

impl GroundClassifier {
    /// Everything except air is ground.
    pub fn new() -> Self {
        Self::deny_list([AIR])
    }

    /// Only the listed blocks are ground.
    pub fn allow_list(ids: impl IntoIterator<Item = u8>) -> Self {
        let mut ground = [false; 256];
        for id in ids {
            ground[id as usize] = true;
        }
        Self { ground }
    }

    /// All blocks except the listed ones are ground.
    pub fn deny_list(ids: impl IntoIterator<Item = u8>) -> Self {
        let mut ground = [true; 256];
        for id in ids {
            ground[id as usize] = false;
        }
        Self { ground }
    }

    /// Loads an allow list from a block list file.
    pub fn allow_list_file(path: &Path) -> Result<Self> {
        Ok(Self::allow_list(read_block_list(path)?))
    }

    /// Loads a deny list from a block list file.
    pub fn deny_list_file(path: &Path) -> Result<Self> {
        Ok(Self::deny_list(read_block_list(path)?))
    }

    /// Number of block ids classified as ground.
    pub fn ground_count(&self) -> usize {
        self.ground.iter().filter(|g| **g).count()
    }
}

impl Default for GroundClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Ground for GroundClassifier {
    #[inline]
    fn is_ground(&self, block_id: u8) -> bool {
        self.ground[block_id as usize]
    }
}

fn read_block_list(path: &Path) -> Result<Vec<u8>> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_block_list(&text)
        .map_err(|msg| Error::Config(format!("{}: {}", path.display(), msg)))
}

/// Parses block ids separated by whitespace or commas. `#` starts a comment.
pub fn parse_block_list(text: &str) -> std::result::Result<Vec<u8>, String> {
    let mut ids = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };

        for token in line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let id = token.parse::<u8>().map_err(|_| {
                format!("line {}: '{}' is not a block id (0-255)", line_no + 1, token)
            })?;
            ids.push(id);
        }
    }

    Ok(ids)
}
