//! Region file location table.
//!
//! The first 4096 bytes hold 1024 entries of 4 bytes each:
//! - 3 bytes big endian sector offset
//! - 1 byte sector count

use super::{CHUNKS_PER_REGION, SECTOR_SIZE};

/// Where a chunk payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLocation {
    /// Header slot, `local_z * 32 + local_x`.
    pub slot: usize,
    /// Byte offset from file start.
    pub offset: usize,
    /// Sectors reserved for the payload.
    pub sectors: u8,
}

impl ChunkLocation {
    /// Chunk has not been generated yet.
    pub fn is_empty(&self) -> bool {
        self.offset == 0 && self.sectors == 0
    }
}

/// Decodes one location entry.
#[inline]
pub fn decode_entry(slot: usize, entry: [u8; 4]) -> ChunkLocation {
    let sector = u32::from_be_bytes([0, entry[0], entry[1], entry[2]]);

    ChunkLocation {
        slot,
        offset: sector as usize * SECTOR_SIZE,
        sectors: entry[3],
    }
}

/// Iterates all 1024 location entries in slot order.
///
/// `header` must be at least 4096 bytes.
pub fn locations(header: &[u8]) -> impl Iterator<Item = ChunkLocation> + '_ {
    header[..CHUNKS_PER_REGION * 4]
        .chunks_exact(4)
        .enumerate()
        .map(|(slot, entry)| decode_entry(slot, [entry[0], entry[1], entry[2], entry[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entry() {
        let location = decode_entry(3, [0x00, 0x01, 0x02, 0x05]);

        assert_eq!(location.slot, 3);
        assert_eq!(location.offset, 0x0102 * 4096);
        assert_eq!(location.sectors, 5);
        assert!(!location.is_empty());
    }

    #[test]
    fn test_decode_high_byte() {
        let location = decode_entry(0, [0x01, 0x00, 0x00, 0x01]);
        assert_eq!(location.offset, 0x10000 * 4096);
    }

    #[test]
    fn test_empty_entry() {
        assert!(decode_entry(0, [0, 0, 0, 0]).is_empty());
        // A count without an offset still counts as present.
        assert!(!decode_entry(0, [0, 0, 0, 1]).is_empty());
    }

    #[test]
    fn test_locations_slot_order() {
        let mut header = vec![0u8; 4096];
        header[4 * 33..4 * 33 + 4].copy_from_slice(&[0, 0, 2, 1]);

        let all: Vec<_> = locations(&header).collect();
        assert_eq!(all.len(), 1024);
        assert_eq!(all.iter().filter(|l| !l.is_empty()).count(), 1);
        assert_eq!(all[33].offset, 8192);
        assert_eq!(all[33].slot, 33);
    }
}
