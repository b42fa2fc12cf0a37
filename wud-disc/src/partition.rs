//! Partitions: type codes, key resolution and loaded metadata.

use std::fmt;
use std::io::{Read, Seek};

use wud_core::crypto::{Key, ZERO_IV};
use wud_core::WudError;

use crate::fst::{self, Cluster, FlatEntry};
use crate::image::ImageReader;
use crate::titlekey::TitleKeySet;
use crate::toc::PartitionTableEntry;

/// Partition type, from the first two characters of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKind {
    /// `SI`: system information, carries tickets
    SystemInfo,
    /// `UP`: system update data
    Update,
    /// `GI`: game information, may carry tickets
    GameInfo,
    /// `GM`: game content, encrypted with a title key
    Game,
    Other,
}

impl PartitionKind {
    pub fn from_name(name: &str) -> Self {
        let code = name.get(..2).unwrap_or(name);
        if code.eq_ignore_ascii_case("SI") {
            Self::SystemInfo
        } else if code.eq_ignore_ascii_case("UP") {
            Self::Update
        } else if code.eq_ignore_ascii_case("GI") {
            Self::GameInfo
        } else if code.eq_ignore_ascii_case("GM") {
            Self::Game
        } else {
            Self::Other
        }
    }

    /// Partitions scanned for `TITLE.TIK`.
    pub fn carries_tickets(&self) -> bool {
        matches!(self, Self::SystemInfo | Self::GameInfo)
    }

    /// Partitions encrypted with the disc key when no title key applies.
    pub fn uses_disc_key(&self) -> bool {
        matches!(self, Self::SystemInfo | Self::Update | Self::GameInfo)
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SystemInfo => "System info",
            Self::Update => "Update",
            Self::GameInfo => "Game info",
            Self::Game => "Game",
            Self::Other => "Unknown",
        };
        f.write_str(name)
    }
}

/// Pick the content key for a partition.
///
/// A matching title key wins over the disc key. `None` means the partition
/// cannot be decrypted.
pub fn resolve_key(
    entry: &PartitionTableEntry,
    title_keys: &TitleKeySet,
    disc_key: &Key,
) -> Option<Key> {
    if let Some(title_key) = title_keys.for_partition(&entry.name) {
        log::debug!("{}: using title key {}", entry.name, title_key.name);
        return Some(title_key.decrypted_key);
    }
    if PartitionKind::from_name(&entry.name).uses_disc_key() {
        return Some(*disc_key);
    }
    None
}

/// A partition whose file table has been decrypted and decoded.
#[derive(Debug, Clone)]
pub struct Partition {
    pub name: String,
    pub kind: PartitionKind,
    /// Partition base, relative to the decrypted area.
    pub offset: u64,
    pub key: Key,
    pub clusters: Vec<Cluster>,
    pub entries: Vec<FlatEntry>,
}

impl Partition {
    /// Decrypt and decode the file table of `entry` with `key`.
    pub fn load<R: Read + Seek>(
        reader: &mut ImageReader<R>,
        entry: &PartitionTableEntry,
        key: &Key,
    ) -> Result<Self, WudError> {
        let meta =
            fst::decode_partition_metadata(reader, &entry.name, entry.offset, key, &ZERO_IV)?;
        Ok(Self {
            name: entry.name.clone(),
            kind: PartitionKind::from_name(&entry.name),
            offset: entry.offset,
            key: *key,
            clusters: meta.clusters,
            entries: meta.entries,
        })
    }

    pub fn total_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn cluster(&self, id: u16) -> Option<&Cluster> {
        self.clusters.get(id as usize)
    }

    /// Indices of file entries whose name matches, ignoring ASCII case.
    pub fn find_files<'a>(&'a self, name: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.entries
            .iter()
            .enumerate()
            .filter(move |(_, e)| !e.is_directory() && e.name.eq_ignore_ascii_case(name))
            .map(|(i, _)| i)
    }

    /// Sum of all file sizes.
    pub fn content_size(&self) -> u64 {
        self.entries.iter().map(FlatEntry::size).sum()
    }
}
