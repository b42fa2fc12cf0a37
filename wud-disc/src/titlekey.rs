//! Title keys unwrapped from `TITLE.TIK` tickets.
//!
//! Game partitions are encrypted with a per-title key. The key ships inside
//! a ticket, itself wrapped with the platform common key using the title id
//! as IV.

use std::collections::BTreeMap;
use std::io::{Read, Seek};

use wud_core::crypto::{self, Iv, Key};
use wud_core::util::hex_upper;
use wud_core::WudError;

use crate::extract::read_file_range;
use crate::image::ImageReader;
use crate::partition::Partition;
use crate::tree::File;
use crate::TITLE_TICKET_FILE;

/// Offset of the wrapped title key inside a ticket.
pub const TICKET_TITLE_KEY_OFFSET: u64 = 0x1BF;

/// Offset of the title id inside a ticket.
pub const TICKET_TITLE_ID_OFFSET: u64 = 0x1DC;

/// Partition names are matched on `"GM"` plus 16 hex digits.
const PARTITION_MATCH_LENGTH: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleKey {
    /// `"GM"` followed by the uppercase hex title id.
    pub name: String,
    pub title_id: [u8; 8],
    pub encrypted_key: Key,
    pub decrypted_key: Key,
    pub iv: Iv,
}

impl TitleKey {
    /// Unwrap a ticket's title key with the common key.
    pub fn unwrap(encrypted_key: Key, title_id: [u8; 8], common_key: &Key) -> Self {
        let mut iv = [0u8; 16];
        iv[..8].copy_from_slice(&title_id);
        Self {
            name: format!("GM{}", hex_upper(&title_id)),
            title_id,
            encrypted_key,
            decrypted_key: crypto::decrypt_block(common_key, &iv, &encrypted_key),
            iv,
        }
    }
}

/// Title keys collected from every ticket partition, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TitleKeySet {
    keys: BTreeMap<String, TitleKey>,
}

impl TitleKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Returns `false` (and keeps the existing one) on a duplicate.
    pub fn insert(&mut self, key: TitleKey) -> bool {
        if self.keys.contains_key(&key.name) {
            log::debug!("Title key {} already known", key.name);
            return false;
        }
        self.keys.insert(key.name.clone(), key);
        true
    }

    pub fn get(&self, name: &str) -> Option<&TitleKey> {
        self.keys.get(name)
    }

    /// The key whose name matches the first 18 characters of a partition
    /// name, ignoring ASCII case.
    pub fn for_partition(&self, partition_name: &str) -> Option<&TitleKey> {
        let prefix = partition_name.get(..PARTITION_MATCH_LENGTH)?;
        self.keys
            .values()
            .find(|k| k.name.eq_ignore_ascii_case(prefix))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TitleKey> {
        self.keys.values()
    }
}

/// Read and unwrap one ticket file.
pub fn read_ticket<R: Read + Seek>(
    reader: &mut ImageReader<R>,
    ticket: &File<'_>,
    common_key: &Key,
) -> Result<TitleKey, WudError> {
    let wrapped = read_file_range(reader, ticket, TICKET_TITLE_KEY_OFFSET, 16)?;
    let title_id = read_file_range(reader, ticket, TICKET_TITLE_ID_OFFSET, 8)?;

    let mut encrypted_key = [0u8; 16];
    let mut id = [0u8; 8];
    if wrapped.len() != encrypted_key.len() || title_id.len() != id.len() {
        return Err(WudError::invalid_image(format!(
            "{} in {} is truncated",
            TITLE_TICKET_FILE, ticket.partition.name
        )));
    }
    encrypted_key.copy_from_slice(&wrapped);
    id.copy_from_slice(&title_id);

    Ok(TitleKey::unwrap(encrypted_key, id, common_key))
}

/// Collect every title key found in a ticket-carrying partition.
///
/// A partition without a ticket yields nothing. Unreadable tickets are
/// logged and skipped.
pub fn collect_from_partition<R: Read + Seek>(
    reader: &mut ImageReader<R>,
    partition: &Partition,
    common_key: &Key,
    keys: &mut TitleKeySet,
) -> usize {
    let mut added = 0;
    for entry_id in partition.find_files(TITLE_TICKET_FILE) {
        let Some(ticket) = File::from_entry(partition, entry_id, &partition.name) else {
            continue;
        };
        match read_ticket(reader, &ticket, common_key) {
            Ok(key) => {
                log::debug!("{}: found title key for {}", partition.name, key.name);
                if keys.insert(key) {
                    added += 1;
                }
            }
            Err(e) => log::warn!("{}: cannot read {}: {}", partition.name, ticket.path(), e),
        }
    }
    added
}
