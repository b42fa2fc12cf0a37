//! Key file loading.
//!
//! Common and disc keys are normally dumped as raw 16-byte blobs. Some dumping
//! tools write them as 32 hex digits instead, so both forms are accepted.

use std::path::Path;

use crate::crypto::Key;
use crate::error::WudError;

/// Length of an AES-128 key in bytes.
pub const KEY_LENGTH: usize = 16;

/// Load a key from a file.
pub fn load_key(path: &Path) -> Result<Key, WudError> {
    let data = std::fs::read(path).map_err(|e| {
        WudError::invalid_key(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_key(&data).map_err(|e| match e {
        WudError::InvalidKey(msg) => WudError::invalid_key(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parse key bytes: 32 hex digits (surrounding whitespace ignored), otherwise
/// the first 16 raw bytes.
pub fn parse_key(data: &[u8]) -> Result<Key, WudError> {
    if let Some(key) = parse_hex_key(data) {
        return Ok(key);
    }
    if data.len() < KEY_LENGTH {
        return Err(WudError::invalid_key(format!(
            "expected {} bytes, got {}",
            KEY_LENGTH,
            data.len()
        )));
    }
    if data.len() > KEY_LENGTH {
        log::debug!(
            "Key file has {} bytes, using the first {}",
            data.len(),
            KEY_LENGTH
        );
    }
    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&data[..KEY_LENGTH]);
    Ok(key)
}

fn parse_hex_key(data: &[u8]) -> Option<Key> {
    let text = std::str::from_utf8(data).ok()?.trim();
    if text.len() != KEY_LENGTH * 2 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let mut key = [0u8; KEY_LENGTH];
    for (i, byte) in key.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&text[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(key)
}

#[cfg(test)]
#[path = "tests/keys_tests.rs"]
mod tests;
