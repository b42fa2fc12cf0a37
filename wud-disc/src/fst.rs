//! Partition file system table (FST) decoding.
//!
//! Layout of the decrypted table:
//!
//! ```text
//! 0x00  "FST\0"
//! 0x04  cluster record stride (BE u32)
//! 0x08  cluster count (BE u32)
//! 0x20  cluster records, `stride` bytes each
//! ....  flat entry table, 16 bytes per entry, entry 0 = root
//! ....  name table (NUL-terminated names)
//! ```
//!
//! The table's total size is only known after entry 0 has been decoded, so
//! the decrypted window grows on demand (see [`MetadataWindow`]).

use std::io::{Read, Seek};

use wud_core::crypto::{Iv, Key};
use wud_core::util::{read_name, read_u16_be, read_u32_be};
use wud_core::WudError;

use crate::image::ImageReader;
use crate::{FILE_TABLE_SIGNATURE, SECTOR_SIZE};

/// Initial window size and growth increment.
pub const WINDOW_STEP: u64 = 0x8000;

/// Size of the fixed FST header before the cluster records.
const FST_HEADER_SIZE: u64 = 0x20;

/// Size of one flat entry record.
pub const ENTRY_SIZE: u64 = 0x10;

/// Lookahead reserved for a NUL-terminated name.
pub const MAX_NAME_LENGTH: u64 = 512;

const CLUSTER_COUNT_OFFSET: usize = 0x08;
const CLUSTER_STRIDE_OFFSET: usize = 0x04;

/// One allocation unit of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster {
    /// Byte offset within the partition data area.
    pub offset: u64,
    pub size: u64,
    pub tag1: u32,
    pub tag2: u32,
}

impl Cluster {
    /// Decode a cluster record (sector, sector count, ..., tags at 0x10/0x14).
    pub fn decode(raw: &[u8]) -> Self {
        let mut offset = read_u32_be(raw, 0x00) as u64 * SECTOR_SIZE;
        // The first sector of the data area holds the FST itself.
        if offset != 0 {
            offset -= SECTOR_SIZE;
        }
        Self {
            offset,
            size: read_u32_be(raw, 0x04) as u64 * SECTOR_SIZE,
            tag1: read_u32_be(raw, 0x10),
            tag2: read_u32_be(raw, 0x14),
        }
    }
}

/// Directory-or-file discriminator, decided once at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Exclusive flat-array bound of this directory's subtree.
    Directory { last_row_in_dir: u32 },
    File { size: u32 },
}

/// One decoded 16-byte record of the flat entry table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    pub kind: EntryKind,
    pub name_offset: u32,
    /// Byte offset within the starting cluster (already shifted).
    pub offset_in_cluster: u64,
    pub starting_cluster: u16,
    pub flags: u16,
    pub name: String,
}

impl FlatEntry {
    /// Decode a record. The name is resolved separately.
    pub fn decode(raw: &[u8]) -> Self {
        let word0 = read_u32_be(raw, 0x00);
        let value = read_u32_be(raw, 0x08);
        let kind = if raw[0] == 1 {
            EntryKind::Directory {
                last_row_in_dir: value,
            }
        } else {
            EntryKind::File { size: value }
        };

        Self {
            kind,
            name_offset: word0 & 0x00FF_FFFF,
            offset_in_cluster: (read_u32_be(raw, 0x04) as u64) << 5,
            starting_cluster: read_u16_be(raw, 0x0E),
            flags: read_u16_be(raw, 0x0C),
            name: String::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory { .. })
    }

    /// `last_row_in_dir` for directories, `None` for files.
    pub fn last_row_in_dir(&self) -> Option<usize> {
        match self.kind {
            EntryKind::Directory { last_row_in_dir } => Some(last_row_in_dir as usize),
            EntryKind::File { .. } => None,
        }
    }

    /// File size; zero for directories.
    pub fn size(&self) -> u64 {
        match self.kind {
            EntryKind::File { size } => size as u64,
            EntryKind::Directory { .. } => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Growing decrypted window
// ---------------------------------------------------------------------------

/// A decrypted prefix of a partition, re-decrypted from the start at a larger
/// size whenever an access falls outside it.
///
/// CBC chains from the partition base, so growing means decrypting the whole
/// prefix again. The window only grows; covered requests never touch the
/// image.
pub struct MetadataWindow<'r, R> {
    reader: &'r mut ImageReader<R>,
    base: u64,
    key: Key,
    iv: Iv,
    buf: Vec<u8>,
    refreshes: usize,
}

impl<'r, R: Read + Seek> MetadataWindow<'r, R> {
    /// Decrypt the initial [`WINDOW_STEP`]-sized window at `base`.
    pub fn open(
        reader: &'r mut ImageReader<R>,
        base: u64,
        key: &Key,
        iv: &Iv,
    ) -> Result<Self, WudError> {
        let mut window = Self {
            reader,
            base,
            key: *key,
            iv: *iv,
            buf: Vec::new(),
            refreshes: 0,
        };
        window.ensure_covers(WINDOW_STEP)?;
        Ok(window)
    }

    /// Make sure bytes `[0, end)` are decrypted.
    pub fn ensure_covers(&mut self, end: u64) -> Result<(), WudError> {
        if end <= self.buf.len() as u64 {
            return Ok(());
        }
        let new_len = end.div_ceil(WINDOW_STEP) * WINDOW_STEP;
        let new_len = usize::try_from(new_len)
            .map_err(|_| WudError::invalid_image(format!("metadata window too large: {}", end)))?;

        log::trace!(
            "Growing metadata window at 0x{:X} from 0x{:X} to 0x{:X}",
            self.base,
            self.buf.len(),
            new_len
        );
        let mut buf = vec![0u8; new_len];
        self.reader
            .read_decrypted_into(self.base, &self.key, &self.iv, &mut buf)?;
        self.buf = buf;
        self.refreshes += 1;
        Ok(())
    }

    /// Bytes decrypted so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// How many times the window has been (re)decrypted.
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }

    fn slice(&mut self, offset: u64, len: u64) -> Result<&[u8], WudError> {
        self.ensure_covers(offset + len)?;
        Ok(&self.buf[offset as usize..(offset + len) as usize])
    }

    fn name_at(&mut self, offset: u64) -> Result<String, WudError> {
        self.ensure_covers(offset + MAX_NAME_LENGTH)?;
        Ok(read_name(&self.buf, offset as usize, MAX_NAME_LENGTH as usize))
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Cluster and entry arrays of one partition.
#[derive(Debug, Clone, Default)]
pub struct PartitionMetadata {
    pub clusters: Vec<Cluster>,
    pub entries: Vec<FlatEntry>,
}

/// Decrypt and decode a partition's file table.
pub fn decode_partition_metadata<R: Read + Seek>(
    reader: &mut ImageReader<R>,
    partition_name: &str,
    base: u64,
    key: &Key,
    iv: &Iv,
) -> Result<PartitionMetadata, WudError> {
    let mut window = MetadataWindow::open(reader, base, key, iv)?;

    if window.bytes()[..4] != FILE_TABLE_SIGNATURE {
        return Err(WudError::invalid_partition_table(
            partition_name,
            "file table signature mismatch (wrong key?)",
        ));
    }

    let cluster_count = read_u32_be(window.bytes(), CLUSTER_COUNT_OFFSET) as u64;
    let stride = read_u32_be(window.bytes(), CLUSTER_STRIDE_OFFSET) as u64;
    if stride < 0x18 {
        return Err(WudError::invalid_partition_table(
            partition_name,
            format!("cluster record stride 0x{:X} is too small", stride),
        ));
    }

    let mut clusters = Vec::with_capacity(cluster_count.min(0x1_0000) as usize);
    for i in 0..cluster_count {
        let raw = window.slice(FST_HEADER_SIZE + i * stride, stride)?;
        clusters.push(Cluster::decode(raw));
    }

    let entry_table = stride * cluster_count + FST_HEADER_SIZE;
    let mut root = FlatEntry::decode(window.slice(entry_table, ENTRY_SIZE)?);
    let total_entries = match root.kind {
        EntryKind::Directory { last_row_in_dir } if last_row_in_dir > 0 => last_row_in_dir as u64,
        _ => {
            return Err(WudError::invalid_partition_table(
                partition_name,
                "root entry is not a directory",
            ));
        }
    };

    let name_table = entry_table + total_entries * ENTRY_SIZE;
    root.name = window.name_at(name_table + root.name_offset as u64)?;

    let mut entries = Vec::with_capacity(total_entries.min(0x10_0000) as usize);
    entries.push(root);
    for i in 1..total_entries {
        let mut entry = FlatEntry::decode(window.slice(entry_table + i * ENTRY_SIZE, ENTRY_SIZE)?);
        entry.name = window.name_at(name_table + entry.name_offset as u64)?;
        entries.push(entry);
    }

    log::debug!(
        "{}: {} clusters, {} entries, window 0x{:X} after {} decrypt passes",
        partition_name,
        clusters.len(),
        entries.len(),
        window.len(),
        window.refreshes()
    );

    Ok(PartitionMetadata { clusters, entries })
}

#[cfg(test)]
#[path = "tests/fst_tests.rs"]
mod tests;
