//! Block decryption engines for file payloads.
//!
//! Two on-disc layouts exist:
//!
//! - **Unhashed**: the cluster is a sequence of 0x8000-byte sectors, each
//!   AES-CBC encrypted on its own with the same per-file IV.
//! - **Hashed**: the cluster is a sequence of 0x10000-byte groups. Each group
//!   has a 0x400-byte header of sixteen 20-byte SHA-1 slots followed by
//!   0xFC00 bytes of payload. The slot for a group is both the payload IV
//!   (first 16 bytes) and the expected hash of the decrypted payload.
//!
//! Both engines stream into any [`Write`]; nothing is buffered beyond one
//! block.

use std::io::{Read, Seek, Write};

use wud_core::crypto::{self, Iv, Key, SHA1_SIZE};
use wud_core::WudError;

use crate::fst::{Cluster, FlatEntry};
use crate::image::ImageReader;
use crate::SECTOR_SIZE;

/// Size of one hashed group on disc.
pub const HASHED_GROUP_SIZE: u64 = 0x10000;

/// Size of the hash header at the start of each group.
pub const HASHED_HEADER_SIZE: usize = 0x400;

/// Size of the payload that follows the header.
pub const HASHED_PAYLOAD_SIZE: usize = 0xFC00;

/// Number of hash slots in a group header.
pub const HASH_SLOTS: u64 = 16;

/// Size of one hash slot.
pub const HASH_SLOT_SIZE: usize = SHA1_SIZE;

/// Entry flag values that mark a hashed file.
const HASHED_ENTRY_FLAGS: [u16; 2] = [0x0400, 0x0040];

/// Cluster tag pair that marks a hashed cluster.
const HASHED_CLUSTER_TAGS: (u32, u32) = (0x0000_0400, 0x0200_0000);

/// Payload layout of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMode {
    Unhashed,
    Hashed,
}

impl HashMode {
    /// Pick the layout for an entry.
    ///
    /// The entry flags and the cluster tags are aliases for the same format
    /// flag; any one of them selects the hashed layout.
    pub fn select(entry: &FlatEntry, cluster: Option<&Cluster>) -> Self {
        let cluster_hashed =
            cluster.is_some_and(|c| (c.tag1, c.tag2) == HASHED_CLUSTER_TAGS);
        if HASHED_ENTRY_FLAGS.contains(&entry.flags) || cluster_hashed {
            Self::Hashed
        } else {
            Self::Unhashed
        }
    }
}

/// Per-file IV: the starting cluster id, big-endian, in the first two bytes.
pub fn file_iv(cluster_id: u16) -> Iv {
    let mut iv = [0u8; 16];
    iv[..2].copy_from_slice(&cluster_id.to_be_bytes());
    iv
}

/// Where a file's bytes live, relative to the decrypted area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRequest {
    /// Partition base offset.
    pub volume_offset: u64,
    /// Starting cluster's offset within the partition.
    pub cluster_offset: u64,
    /// Byte offset within the cluster's (payload) stream.
    pub file_offset: u64,
    /// Number of bytes to produce.
    pub length: u64,
}

/// Outcome of one decrypt call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecryptReport {
    pub bytes_written: u64,
    /// Hashed groups whose SHA-1 did not match the header.
    pub hash_mismatches: u32,
    /// Output writes that failed; the bytes are lost but decryption went on.
    pub write_failures: u32,
}

impl DecryptReport {
    fn copy_out<W: Write>(&mut self, out: &mut W, bytes: &[u8]) {
        match out.write_all(bytes) {
            Ok(()) => self.bytes_written += bytes.len() as u64,
            Err(e) => {
                self.write_failures += 1;
                log::warn!("Could not write {} bytes of output: {}", bytes.len(), e);
            }
        }
    }
}

/// Stream-decrypt an unhashed range.
pub fn decrypt_unhashed<R: Read + Seek, W: Write>(
    reader: &mut ImageReader<R>,
    key: &Key,
    iv: &Iv,
    request: &BlockRequest,
    out: &mut W,
) -> Result<DecryptReport, WudError> {
    let mut report = DecryptReport::default();
    let mut block = vec![0u8; SECTOR_SIZE as usize];
    let mut file_offset = request.file_offset;
    let mut remaining = request.length;

    while remaining > 0 {
        let block_number = file_offset / SECTOR_SIZE;
        let block_offset = file_offset % SECTOR_SIZE;

        let read_offset =
            request.volume_offset + request.cluster_offset + block_number * SECTOR_SIZE;
        reader.read_decrypted_into(read_offset, key, iv, &mut block)?;

        let copy_size = remaining.min(SECTOR_SIZE - block_offset);
        let start = block_offset as usize;
        report.copy_out(out, &block[start..start + copy_size as usize]);

        remaining -= copy_size;
        file_offset += copy_size;
    }

    Ok(report)
}

/// Stream-decrypt a hashed range, verifying each group's SHA-1.
///
/// A mismatch is counted and logged; the decrypted bytes are written anyway.
pub fn decrypt_hashed<R: Read + Seek, W: Write>(
    reader: &mut ImageReader<R>,
    key: &Key,
    iv: &Iv,
    cluster_id: u16,
    request: &BlockRequest,
    out: &mut W,
) -> Result<DecryptReport, WudError> {
    let payload_size = HASHED_PAYLOAD_SIZE as u64;
    let mut report = DecryptReport::default();
    let mut header = vec![0u8; HASHED_HEADER_SIZE];
    let mut payload = vec![0u8; HASHED_PAYLOAD_SIZE];
    let mut file_offset = request.file_offset;
    let mut remaining = request.length;

    while remaining > 0 {
        let block_number = file_offset / payload_size;
        let block_offset = file_offset % payload_size;

        let slot = (block_number % HASH_SLOTS) as usize;

        let group_offset =
            request.volume_offset + request.cluster_offset + block_number * HASHED_GROUP_SIZE;
        reader.read_decrypted_into(group_offset, key, iv, &mut header)?;

        let (payload_iv, expected) = slot_iv_and_hash(&header, slot, cluster_id);

        reader.read_decrypted_into(
            group_offset + HASHED_HEADER_SIZE as u64,
            key,
            &payload_iv,
            &mut payload,
        )?;

        let mut actual = crypto::sha1(&payload);
        if slot == 0 {
            actual[1] ^= cluster_id as u8;
        }
        if actual != expected {
            report.hash_mismatches += 1;
            log::debug!(
                "SHA-1 mismatch in hashed group {} (cluster {}, slot {})",
                block_number,
                cluster_id,
                slot
            );
        }

        let copy_size = remaining.min(payload_size - block_offset);
        let start = block_offset as usize;
        report.copy_out(out, &payload[start..start + copy_size as usize]);

        remaining -= copy_size;
        file_offset += copy_size;
    }

    Ok(report)
}

/// Derive the payload IV and expected hash from a decrypted group header.
///
/// Slot 0 carries the low byte of the cluster id XORed into byte 1, so the
/// same tweak is undone on the IV and applied to the computed hash.
pub fn slot_iv_and_hash(header: &[u8], slot: usize, cluster_id: u16) -> (Iv, [u8; SHA1_SIZE]) {
    let start = slot * HASH_SLOT_SIZE;
    let mut expected = [0u8; SHA1_SIZE];
    expected.copy_from_slice(&header[start..start + HASH_SLOT_SIZE]);

    let mut payload_iv = [0u8; 16];
    payload_iv.copy_from_slice(&expected[..16]);
    if slot == 0 {
        payload_iv[1] ^= cluster_id as u8;
    }
    (payload_iv, expected)
}

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod tests;
