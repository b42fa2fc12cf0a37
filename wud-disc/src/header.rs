//! Clear disc header at the start of the image.

use std::io::{Read, Seek};

use wud_core::util::read_ascii_fixed;
use wud_core::{Region, WudError};

use crate::image::ImageReader;
use crate::WUD_MAGIC;

/// Number of header bytes read from offset 0.
const HEADER_SIZE: usize = 0x14;

/// Information printed on the disc header, e.g. `WUP-P-ARPE_00_550USA`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscHeader {
    /// Product code, e.g. `WUP-P-ARPE`
    pub serial: String,
    /// Game revision, e.g. `00`
    pub revision: String,
    /// Minimum system version digits, e.g. `550`
    pub system_version: String,
    /// Raw region field, e.g. `USA`
    pub region_code: String,
    pub region: Region,
    /// Whether the image starts with `WUP-`
    pub has_magic: bool,
}

impl DiscHeader {
    pub fn parse(buf: &[u8]) -> Result<Self, WudError> {
        if buf.len() < HEADER_SIZE {
            return Err(WudError::invalid_image(format!(
                "header too short: {} bytes",
                buf.len()
            )));
        }

        let serial = read_ascii_fixed(&buf[0x00..0x0A]);
        let region_code = read_ascii_fixed(&buf[0x11..0x14]);
        let mut region = Region::from_disc_code(&region_code);
        if region == Region::Unknown {
            region = serial
                .chars()
                .last()
                .and_then(Region::from_code_char)
                .unwrap_or(Region::Unknown);
        }

        Ok(Self {
            serial,
            revision: read_ascii_fixed(&buf[0x0B..0x0D]),
            system_version: read_ascii_fixed(&buf[0x0E..0x11]),
            region_code,
            region,
            has_magic: buf[..4] == WUD_MAGIC,
        })
    }

    /// Read the header from the start of the image.
    ///
    /// A missing `WUP-` magic is only a warning; an unreadable header is fatal.
    pub fn read<R: Read + Seek>(reader: &mut ImageReader<R>) -> Result<Self, WudError> {
        let buf = reader
            .read_raw(0, HEADER_SIZE)
            .map_err(|e| WudError::invalid_image(format!("cannot read disc header: {}", e)))?;
        let header = Self::parse(&buf)?;
        if !header.has_magic {
            log::warn!("Image does not start with WUP-, probably not a WUD image; continuing anyway");
        }
        Ok(header)
    }

    /// System version formatted as `a.b.c`.
    pub fn system_version_dotted(&self) -> String {
        self.system_version
            .chars()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}
