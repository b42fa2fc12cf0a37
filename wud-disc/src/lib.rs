//! Wii U disc image (WUD) decryption and extraction.
//!
//! A WUD image is a raw dump of a Wii U optical disc. Past a small clear
//! header, everything lives in a "decrypted area" starting at `0x18000`:
//!
//! - a partition table of contents, encrypted with the disc key,
//! - one partition per title or system component, each starting with an
//!   encrypted file system table (FST) that lists clusters and a flat,
//!   range-delimited array of directory and file entries,
//! - file payloads, either plain AES-CBC per 0x8000-byte sector or "hashed"
//!   0x10000-byte groups whose 0x400-byte header carries SHA-1 hashes that
//!   double as payload IVs.
//!
//! System partitions (`SI`, `UP`, `GI`) use the disc key. Game partitions
//! (`GM<title id>`) use a title key wrapped with the common key inside a
//! `TITLE.TIK` ticket stored in the `SI`/`GI` partitions.

pub mod disc;
pub mod engine;
pub mod extract;
pub mod fst;
pub mod header;
pub mod image;
pub mod partition;
pub mod titlekey;
pub mod toc;
pub mod tree;

pub use disc::{ExtractSummary, WudImage};
pub use engine::{DecryptReport, HashMode};
pub use fst::{Cluster, EntryKind, FlatEntry};
pub use header::DiscHeader;
pub use image::ImageReader;
pub use partition::{Partition, PartitionKind};
pub use titlekey::{TitleKey, TitleKeySet};
pub use toc::PartitionTableEntry;
pub use tree::{Directory, File};

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

/// Size of a disc sector; most offsets and sizes are stored in sectors.
pub const SECTOR_SIZE: u64 = 0x8000;

/// Absolute image offset of the decrypted area. All partition-relative reads
/// are displaced by this amount.
pub const DECRYPTED_AREA_OFFSET: u64 = 0x18000;

/// Subtracted from `raw_sector * SECTOR_SIZE` to get a partition offset
/// relative to the decrypted area.
pub const PARTITION_OFFSET_ADJUST: u64 = 0x10000;

/// Magic at the start of a WUD image (`WUP-`).
pub const WUD_MAGIC: [u8; 4] = *b"WUP-";

/// Signature at the start of the decrypted partition table.
pub const DECRYPTED_AREA_SIGNATURE: [u8; 4] = [0xCC, 0xA6, 0xE6, 0x7B];

/// Signature at the start of a decrypted partition file table.
pub const FILE_TABLE_SIGNATURE: [u8; 4] = *b"FST\0";

/// Ticket file carrying a wrapped title key.
pub const TITLE_TICKET_FILE: &str = "TITLE.TIK";

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
