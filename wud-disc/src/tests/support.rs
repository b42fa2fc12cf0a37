//! Synthetic file-table and payload builders for unit tests.

use wud_core::crypto::{self, Iv, Key, ZERO_IV};

use crate::engine::{HASH_SLOT_SIZE, HASHED_HEADER_SIZE, HASHED_PAYLOAD_SIZE, file_iv};
use crate::{DECRYPTED_AREA_OFFSET, SECTOR_SIZE};

pub(crate) struct EntryDef {
    pub dir: bool,
    pub name: String,
    pub value: u32,
    pub offset_in_cluster: u64,
    pub cluster: u16,
    pub flags: u16,
}

pub(crate) fn dir(name: &str, last_row_in_dir: u32) -> EntryDef {
    EntryDef {
        dir: true,
        name: name.to_string(),
        value: last_row_in_dir,
        offset_in_cluster: 0,
        cluster: 0,
        flags: 0,
    }
}

pub(crate) fn file(name: &str, size: u32, cluster: u16, offset_in_cluster: u64) -> EntryDef {
    EntryDef {
        dir: false,
        name: name.to_string(),
        value: size,
        offset_in_cluster,
        cluster,
        flags: 0,
    }
}

/// `(sector, size in sectors, tag1, tag2)` per cluster.
pub(crate) type ClusterDef = (u32, u32, u32, u32);

/// Build a plaintext FST padded to a whole number of sectors.
pub(crate) fn build_fst(clusters: &[ClusterDef], entries: &[EntryDef]) -> Vec<u8> {
    let mut fst = vec![0u8; 0x20];
    fst[..4].copy_from_slice(b"FST\0");
    fst[0x04..0x08].copy_from_slice(&0x20u32.to_be_bytes());
    fst[0x08..0x0C].copy_from_slice(&(clusters.len() as u32).to_be_bytes());

    for &(sector, size, tag1, tag2) in clusters {
        let mut record = [0u8; 0x20];
        record[0x00..0x04].copy_from_slice(&sector.to_be_bytes());
        record[0x04..0x08].copy_from_slice(&size.to_be_bytes());
        record[0x10..0x14].copy_from_slice(&tag1.to_be_bytes());
        record[0x14..0x18].copy_from_slice(&tag2.to_be_bytes());
        fst.extend_from_slice(&record);
    }

    let mut names = Vec::new();
    for entry in entries {
        let name_offset = names.len() as u32;
        names.extend_from_slice(entry.name.as_bytes());
        names.push(0);

        let mut record = [0u8; 0x10];
        record[0..4].copy_from_slice(&name_offset.to_be_bytes());
        record[0] = if entry.dir { 1 } else { 0 };
        record[4..8].copy_from_slice(&((entry.offset_in_cluster >> 5) as u32).to_be_bytes());
        record[8..12].copy_from_slice(&entry.value.to_be_bytes());
        record[12..14].copy_from_slice(&entry.flags.to_be_bytes());
        record[14..16].copy_from_slice(&entry.cluster.to_be_bytes());
        fst.extend_from_slice(&record);
    }
    fst.extend_from_slice(&names);

    let padded = (fst.len() as u64).div_ceil(SECTOR_SIZE) * SECTOR_SIZE;
    fst.resize(padded as usize, 0);
    fst
}

/// Place an FST encrypted with `key` at decrypted-area offset `base`.
pub(crate) fn image_with_fst(base: u64, key: &Key, fst: &[u8]) -> Vec<u8> {
    let mut encrypted = fst.to_vec();
    crypto::encrypt_cbc(key, &ZERO_IV, &mut encrypted).unwrap();
    let start = (DECRYPTED_AREA_OFFSET + base) as usize;
    let mut image = vec![0u8; start];
    image.extend_from_slice(&encrypted);
    image
}

/// Write `data` into `image` at `at`, growing it as needed.
pub(crate) fn place(image: &mut Vec<u8>, at: usize, data: &[u8]) {
    if image.len() < at + data.len() {
        image.resize(at + data.len(), 0);
    }
    image[at..at + data.len()].copy_from_slice(data);
}

/// Encrypt a cluster stream as independent 0x8000-byte blocks.
pub(crate) fn encrypt_unhashed(plain: &[u8], key: &Key, iv: &Iv) -> Vec<u8> {
    let len = (plain.len() as u64).div_ceil(SECTOR_SIZE) * SECTOR_SIZE;
    let mut out = plain.to_vec();
    out.resize(len as usize, 0);
    for block in out.chunks_mut(SECTOR_SIZE as usize) {
        crypto::encrypt_cbc(key, iv, block).unwrap();
    }
    out
}

/// Encode a payload stream as hashed groups for `cluster_id`.
pub(crate) fn encrypt_hashed(plain: &[u8], key: &Key, cluster_id: u16) -> Vec<u8> {
    let header_iv = file_iv(cluster_id);
    let mut out = Vec::new();
    for (group, chunk) in plain.chunks(HASHED_PAYLOAD_SIZE).enumerate() {
        let mut payload = chunk.to_vec();
        payload.resize(HASHED_PAYLOAD_SIZE, 0);

        let slot = group % 16;
        let digest = crypto::sha1(&payload);
        let mut stored = digest;
        if slot == 0 {
            stored[1] ^= cluster_id as u8;
        }

        let mut header = vec![0u8; HASHED_HEADER_SIZE];
        header[slot * HASH_SLOT_SIZE..(slot + 1) * HASH_SLOT_SIZE].copy_from_slice(&stored);

        let mut payload_iv = [0u8; 16];
        payload_iv.copy_from_slice(&stored[..16]);
        if slot == 0 {
            payload_iv[1] ^= cluster_id as u8;
        }

        crypto::encrypt_cbc(key, &header_iv, &mut header).unwrap();
        crypto::encrypt_cbc(key, &payload_iv, &mut payload).unwrap();
        out.extend_from_slice(&header);
        out.extend_from_slice(&payload);
    }
    out
}
