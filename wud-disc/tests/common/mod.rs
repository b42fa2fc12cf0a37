//! Synthetic WUD image builder shared by the integration tests.

#![allow(dead_code)]

use wud_core::crypto::{Key, ZERO_IV, encrypt_cbc, sha1};
use wud_disc::engine::{HASH_SLOT_SIZE, HASHED_HEADER_SIZE, HASHED_PAYLOAD_SIZE, file_iv};
use wud_disc::{DECRYPTED_AREA_OFFSET, DECRYPTED_AREA_SIGNATURE, SECTOR_SIZE};

pub const HEADER: &[u8; 20] = b"WUP-P-ABCE_00_550USA";
pub const COMMON_KEY: Key = [0xC0; 16];
pub const DISC_KEY: Key = [0xD1; 16];
pub const TITLE_KEY: Key = [0x7E; 16];
pub const TITLE_ID: [u8; 8] = [0x00, 0x05, 0x00, 0x00, 0x10, 0xAB, 0xCD, 0x00];
pub const GAME_PARTITION: &str = "GM0005000010ABCD00";

pub enum Node {
    Dir(String, Vec<Node>),
    File {
        name: String,
        data: Vec<u8>,
        hashed: bool,
    },
}

pub fn dir(name: &str, children: Vec<Node>) -> Node {
    Node::Dir(name.to_string(), children)
}

pub fn file(name: &str, data: Vec<u8>) -> Node {
    Node::File {
        name: name.to_string(),
        data,
        hashed: false,
    }
}

pub fn hashed_file(name: &str, data: Vec<u8>) -> Node {
    Node::File {
        name: name.to_string(),
        data,
        hashed: true,
    }
}

/// Deterministic filler bytes.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed) ^ (i >> 9) as u8)
        .collect()
}

/// A ticket carrying `TITLE_KEY` wrapped with `COMMON_KEY`.
pub fn ticket() -> Vec<u8> {
    let mut iv = [0u8; 16];
    iv[..8].copy_from_slice(&TITLE_ID);
    let mut wrapped = TITLE_KEY;
    encrypt_cbc(&COMMON_KEY, &iv, &mut wrapped).unwrap();

    let mut tik = vec![0u8; 0x350];
    tik[0x1BF..0x1CF].copy_from_slice(&wrapped);
    tik[0x1DC..0x1E4].copy_from_slice(&TITLE_ID);
    tik
}

// ---------------------------------------------------------------------------
// Partition encoding
// ---------------------------------------------------------------------------

struct Row {
    dir: bool,
    name: String,
    value: u32,
    cluster: u16,
    flags: u16,
}

/// Flatten a tree into FST rows and the cluster payloads of its files.
fn flatten(nodes: &[Node], rows: &mut Vec<Row>, payloads: &mut Vec<(Vec<u8>, bool)>) {
    for node in nodes {
        match node {
            Node::Dir(name, children) => {
                let at = rows.len();
                rows.push(Row {
                    dir: true,
                    name: name.clone(),
                    value: 0,
                    cluster: 0,
                    flags: 0,
                });
                flatten(children, rows, payloads);
                rows[at].value = rows.len() as u32;
            }
            Node::File { name, data, hashed } => {
                payloads.push((data.clone(), *hashed));
                rows.push(Row {
                    dir: false,
                    name: name.clone(),
                    value: data.len() as u32,
                    cluster: payloads.len() as u16,
                    flags: if *hashed { 0x0400 } else { 0 },
                });
            }
        }
    }
}

fn encode_fst(cluster_sectors: &[(u32, u32)], rows: &[Row]) -> Vec<u8> {
    let mut fst = vec![0u8; 0x20];
    fst[..4].copy_from_slice(b"FST\0");
    fst[0x04..0x08].copy_from_slice(&0x20u32.to_be_bytes());
    fst[0x08..0x0C].copy_from_slice(&(cluster_sectors.len() as u32).to_be_bytes());
    for &(sector, count) in cluster_sectors {
        let mut record = [0u8; 0x20];
        record[0..4].copy_from_slice(&sector.to_be_bytes());
        record[4..8].copy_from_slice(&count.to_be_bytes());
        fst.extend_from_slice(&record);
    }

    let mut names = Vec::new();
    for row in rows {
        let name_offset = names.len() as u32;
        names.extend_from_slice(row.name.as_bytes());
        names.push(0);

        let mut record = [0u8; 0x10];
        record[0..4].copy_from_slice(&name_offset.to_be_bytes());
        record[0] = row.dir as u8;
        record[8..12].copy_from_slice(&row.value.to_be_bytes());
        record[12..14].copy_from_slice(&row.flags.to_be_bytes());
        record[14..16].copy_from_slice(&row.cluster.to_be_bytes());
        fst.extend_from_slice(&record);
    }
    fst.extend_from_slice(&names);

    let padded = (fst.len() as u64).div_ceil(SECTOR_SIZE) * SECTOR_SIZE;
    fst.resize(padded as usize, 0);
    fst
}

fn encrypt_unhashed(plain: &[u8], key: &Key, cluster_id: u16) -> Vec<u8> {
    let len = (plain.len().max(1) as u64).div_ceil(SECTOR_SIZE) * SECTOR_SIZE;
    let mut out = plain.to_vec();
    out.resize(len as usize, 0);
    let iv = file_iv(cluster_id);
    for block in out.chunks_mut(SECTOR_SIZE as usize) {
        encrypt_cbc(key, &iv, block).unwrap();
    }
    out
}

fn encrypt_hashed(plain: &[u8], key: &Key, cluster_id: u16) -> Vec<u8> {
    let header_iv = file_iv(cluster_id);
    let mut out = Vec::new();
    for (group, chunk) in plain.chunks(HASHED_PAYLOAD_SIZE).enumerate() {
        let mut payload = chunk.to_vec();
        payload.resize(HASHED_PAYLOAD_SIZE, 0);

        let slot = group % 16;
        let mut stored = sha1(&payload);
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

        encrypt_cbc(key, &header_iv, &mut header).unwrap();
        encrypt_cbc(key, &payload_iv, &mut payload).unwrap();
        out.extend_from_slice(&header);
        out.extend_from_slice(&payload);
    }
    out
}

/// Encode one partition: encrypted FST followed by its clusters.
///
/// Cluster 0 is the FST itself; every file gets its own cluster.
fn encode_partition(key: &Key, tree: &[Node]) -> Vec<u8> {
    let mut rows = vec![Row {
        dir: true,
        name: String::new(),
        value: 0,
        cluster: 0,
        flags: 0,
    }];
    let mut payloads = Vec::new();
    flatten(tree, &mut rows, &mut payloads);
    rows[0].value = rows.len() as u32;

    let encoded: Vec<Vec<u8>> = payloads
        .iter()
        .enumerate()
        .map(|(i, (data, hashed))| {
            let cluster_id = (i + 1) as u16;
            if *hashed {
                encrypt_hashed(data, key, cluster_id)
            } else {
                encrypt_unhashed(data, key, cluster_id)
            }
        })
        .collect();

    // The FST size does not depend on the sector values, so size it first.
    let placeholder = vec![(0, 0); encoded.len() + 1];
    let fst_sectors = encode_fst(&placeholder, &rows).len() as u64 / SECTOR_SIZE;

    let mut clusters = vec![(1u32, fst_sectors as u32)];
    let mut next_sector = 1 + fst_sectors as u32;
    for data in &encoded {
        let sectors = (data.len() as u64 / SECTOR_SIZE) as u32;
        clusters.push((next_sector, sectors));
        next_sector += sectors;
    }

    let mut out = encode_fst(&clusters, &rows);
    encrypt_cbc(key, &ZERO_IV, &mut out).unwrap();
    for data in encoded {
        out.extend_from_slice(&data);
    }
    out
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

pub struct ImageBuilder {
    disc_key: Key,
    partitions: Vec<(String, Key, Vec<Node>)>,
}

impl ImageBuilder {
    pub fn new(disc_key: Key) -> Self {
        Self {
            disc_key,
            partitions: Vec::new(),
        }
    }

    pub fn partition(mut self, name: &str, key: Key, tree: Vec<Node>) -> Self {
        self.partitions.push((name.to_string(), key, tree));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = vec![0u8; DECRYPTED_AREA_OFFSET as usize];
        image[..HEADER.len()].copy_from_slice(HEADER);

        let mut toc = vec![0u8; 0x8000];
        toc[..4].copy_from_slice(&DECRYPTED_AREA_SIGNATURE);
        toc[0x1C..0x20].copy_from_slice(&(self.partitions.len() as u32).to_be_bytes());

        let mut sector = 4u32;
        let mut bodies = Vec::new();
        for (i, (name, key, tree)) in self.partitions.iter().enumerate() {
            let entry = 0x800 + i * 0x80;
            toc[entry..entry + name.len()].copy_from_slice(name.as_bytes());
            toc[entry + 0x20..entry + 0x24].copy_from_slice(&sector.to_be_bytes());

            let body = encode_partition(key, tree);
            let area_offset = sector as u64 * SECTOR_SIZE - 0x10000;
            bodies.push(((DECRYPTED_AREA_OFFSET + area_offset) as usize, body));
            sector += (bodies[i].1.len() as u64 / SECTOR_SIZE) as u32 + 1;
        }

        encrypt_cbc(&self.disc_key, &ZERO_IV, &mut toc).unwrap();
        image.extend_from_slice(&toc);

        for (at, body) in bodies {
            if image.len() < at + body.len() {
                image.resize(at + body.len(), 0);
            }
            image[at..at + body.len()].copy_from_slice(&body);
        }
        image
    }
}

/// SI with a ticket, UP with a plain file, and a game partition with an
/// unhashed and a hashed file.
pub fn sample_builder() -> ImageBuilder {
    ImageBuilder::new(DISC_KEY)
        .partition(
            "SI",
            DISC_KEY,
            vec![
                file("TITLE.TIK", ticket()),
                dir("sys", vec![file("version.bin", pattern(40, 1))]),
            ],
        )
        .partition("UP", DISC_KEY, vec![file("update.bin", pattern(0x8000, 2))])
        .partition(
            GAME_PARTITION,
            TITLE_KEY,
            vec![
                dir("code", vec![file("app.rpx", pattern(0x8000 + 123, 3))]),
                dir(
                    "content",
                    vec![
                        hashed_file("big.bin", pattern(HASHED_PAYLOAD_SIZE + 500, 4)),
                        file("empty.txt", Vec::new()),
                    ],
                ),
            ],
        )
}
