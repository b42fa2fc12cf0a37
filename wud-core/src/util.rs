//! Byte codec and small string helpers shared by the disc parsers.
//!
//! Every multi-byte integer in a WUD image is big-endian. The readers here
//! index directly into a buffer and panic on out-of-range offsets, so callers
//! must bounds-check (or size their buffers) first.

// ---------------------------------------------------------------------------
// Big-endian readers
// ---------------------------------------------------------------------------

pub fn read_u16_be(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

pub fn read_u32_be(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Read a null-terminated ASCII string from a byte slice.
///
/// Stops at the first null byte, filters out non-printable characters,
/// and returns the result. No trimming is performed.
pub fn read_ascii(buf: &[u8]) -> String {
    buf.iter()
        .take_while(|&&b| b != 0)
        .filter(|&&b| (0x20..0x7F).contains(&b))
        .map(|&b| b as char)
        .collect()
}

/// Read a fixed-length ASCII string from a byte slice.
///
/// Non-printable bytes are replaced with spaces, then the result is trimmed.
/// Unlike [`read_ascii`], this does NOT stop at null bytes.
pub fn read_ascii_fixed(buf: &[u8]) -> String {
    let s: String = buf
        .iter()
        .map(|&b| {
            if (0x20..0x7F).contains(&b) {
                b as char
            } else {
                ' '
            }
        })
        .collect();
    s.trim().to_string()
}

/// Read a null-terminated name of at most `max_len` bytes.
///
/// Filenames inside a partition are not guaranteed to be ASCII, so invalid
/// UTF-8 is replaced rather than dropped.
pub fn read_name(buf: &[u8], offset: usize, max_len: usize) -> String {
    let Some(tail) = buf.get(offset..) else {
        return String::new();
    };
    let tail = &tail[..tail.len().min(max_len)];
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    String::from_utf8_lossy(&tail[..end]).into_owned()
}

/// Encode bytes as uppercase hex (e.g. a title id `0005000010101A00`).
pub fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Whether `name` can be used as a single path component below an output
/// directory.
///
/// Empty names, `.`, `..`, and names containing a separator or NUL are
/// rejected.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Join a materialized path and a child name with a single `/`.
///
/// An empty parent yields just the child; a parent already ending in `/`
/// is not given a second one.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        parent.to_string()
    } else if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

#[cfg(test)]
#[path = "tests/util_tests.rs"]
mod tests;
