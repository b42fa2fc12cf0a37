//! Partition table of contents.
//!
//! The TOC is the first sector of the decrypted area, encrypted with the
//! disc key and a zero IV.

use std::io::{Read, Seek};

use wud_core::crypto::{Key, ZERO_IV};
use wud_core::util::{read_ascii, read_u32_be};
use wud_core::WudError;

use crate::image::ImageReader;
use crate::{DECRYPTED_AREA_SIGNATURE, PARTITION_OFFSET_ADJUST, SECTOR_SIZE};

/// Size of the decrypted TOC buffer.
pub const TOC_SIZE: usize = 0x8000;

/// Offset of the big-endian partition count.
const PARTITION_COUNT_OFFSET: usize = 0x1C;

/// Offset of the first partition entry.
const PARTITION_TOC_OFFSET: usize = 0x800;

/// Stride between partition entries.
pub const PARTITION_TOC_ENTRY_SIZE: usize = 0x80;

/// Bytes of raw identifier kept per entry.
const IDENTIFIER_LENGTH: usize = 0x19;

/// The name is NUL-terminated text that ends before the sector field.
const NAME_FIELD_LENGTH: usize = 0x20;

/// Offset of the big-endian start sector within an entry.
const SECTOR_FIELD_OFFSET: usize = 0x20;

/// One row of the partition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTableEntry {
    pub identifier: [u8; IDENTIFIER_LENGTH],
    /// e.g. `SI`, `UP`, `GI` or `GM0005000010101A00`
    pub name: String,
    /// Byte offset relative to the decrypted area.
    pub offset: u64,
}

/// Convert a raw start sector to a decrypted-area byte offset.
pub fn sector_to_offset(raw_sector: u32) -> u64 {
    (raw_sector as u64 * SECTOR_SIZE).saturating_sub(PARTITION_OFFSET_ADJUST)
}

/// Parse an already-decrypted TOC buffer.
pub fn parse_partition_table(buf: &[u8]) -> Result<Vec<PartitionTableEntry>, WudError> {
    if buf.len() < PARTITION_TOC_OFFSET || buf[..4] != DECRYPTED_AREA_SIGNATURE {
        return Err(WudError::invalid_image(
            "partition table signature mismatch (wrong disc key?)",
        ));
    }

    let count = read_u32_be(buf, PARTITION_COUNT_OFFSET) as usize;
    let capacity = (buf.len() - PARTITION_TOC_OFFSET) / PARTITION_TOC_ENTRY_SIZE;
    if count > capacity {
        return Err(WudError::invalid_image(format!(
            "partition count {} exceeds table capacity {}",
            count, capacity
        )));
    }

    let entries = (0..count)
        .map(|i| {
            let start = PARTITION_TOC_OFFSET + i * PARTITION_TOC_ENTRY_SIZE;
            let raw = &buf[start..start + PARTITION_TOC_ENTRY_SIZE];

            let mut identifier = [0u8; IDENTIFIER_LENGTH];
            identifier.copy_from_slice(&raw[..IDENTIFIER_LENGTH]);

            PartitionTableEntry {
                identifier,
                name: read_ascii(&raw[..NAME_FIELD_LENGTH]),
                offset: sector_to_offset(read_u32_be(raw, SECTOR_FIELD_OFFSET)),
            }
        })
        .collect();
    Ok(entries)
}

/// Decrypt and parse the partition table.
pub fn read_partition_table<R: Read + Seek>(
    reader: &mut ImageReader<R>,
    disc_key: &Key,
) -> Result<Vec<PartitionTableEntry>, WudError> {
    let buf = reader
        .read_decrypted(0, TOC_SIZE, disc_key, &ZERO_IV)
        .map_err(|e| WudError::invalid_image(format!("cannot decrypt partition table: {}", e)))?;
    let partitions = parse_partition_table(&buf)?;
    log::debug!("Partition table lists {} partitions", partitions.len());
    Ok(partitions)
}

#[cfg(test)]
#[path = "tests/toc_tests.rs"]
mod tests;
