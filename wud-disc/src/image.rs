//! Random-access reads from the source image.

use std::io::{self, Read, Seek, SeekFrom};

use wud_core::crypto::{self, Iv, Key};
use wud_core::WudError;

use crate::DECRYPTED_AREA_OFFSET;

/// Reads raw and decrypted ranges from a WUD image.
///
/// Every read seeks first; no stream position is relied upon between calls.
/// Offsets passed to the `area` methods are relative to the decrypted area
/// and are displaced by a constant base (normally [`DECRYPTED_AREA_OFFSET`]).
pub struct ImageReader<R> {
    inner: R,
    base: u64,
    reads: u64,
}

impl<R: Read + Seek> ImageReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_base(inner, DECRYPTED_AREA_OFFSET)
    }

    pub fn with_base(inner: R, base: u64) -> Self {
        Self {
            inner,
            base,
            reads: 0,
        }
    }

    /// Number of reads issued against the underlying image so far.
    pub fn read_count(&self) -> u64 {
        self.reads
    }

    /// Read exactly `len` bytes at an absolute image offset.
    ///
    /// Used for the clear header; a short read is an error.
    pub fn read_raw(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, WudError> {
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        self.reads += 1;
        Ok(buf)
    }

    /// Fill `buf` from `area_offset` within the decrypted area.
    ///
    /// Bytes past the end of the image read as zero and are logged.
    pub fn read_area(&mut self, area_offset: u64, buf: &mut [u8]) -> Result<(), WudError> {
        let absolute = self.base + area_offset;
        self.inner.seek(SeekFrom::Start(absolute))?;

        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.reads += 1;

        if filled < buf.len() {
            log::warn!(
                "Short read at 0x{:X}: wanted {} bytes, got {}",
                absolute,
                buf.len(),
                filled
            );
            buf[filled..].fill(0);
        }
        Ok(())
    }

    /// Read and decrypt `buf.len()` bytes at `area_offset` in one step.
    pub fn read_decrypted_into(
        &mut self,
        area_offset: u64,
        key: &Key,
        iv: &Iv,
        buf: &mut [u8],
    ) -> Result<(), WudError> {
        self.read_area(area_offset, buf)?;
        crypto::decrypt_cbc(key, iv, buf)
    }

    /// Read and decrypt `len` bytes at `area_offset` into a new buffer.
    pub fn read_decrypted(
        &mut self,
        area_offset: u64,
        len: usize,
        key: &Key,
        iv: &Iv,
    ) -> Result<Vec<u8>, WudError> {
        let mut buf = vec![0u8; len];
        self.read_decrypted_into(area_offset, key, iv, &mut buf)?;
        Ok(buf)
    }
}
