//! File-level reads and the extraction walk.

use std::fs;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use std::sync::mpsc::Sender;

use wud_core::crypto::Key;
use wud_core::{ExtractOptions, ExtractProgress, WudError};

use crate::disc::ExtractSummary;
use crate::engine::{self, BlockRequest, DecryptReport, HashMode};
use crate::image::ImageReader;
use crate::tree::{Directory, File};

/// Decrypt `length` bytes of `file`, starting `offset` bytes into it, into
/// `out`.
pub fn decrypt_file_to<R: Read + Seek, W: Write>(
    reader: &mut ImageReader<R>,
    file: &File<'_>,
    offset: u64,
    length: u64,
    out: &mut W,
) -> Result<DecryptReport, WudError> {
    let cluster_id = file.cluster_id();
    let iv = engine::file_iv(cluster_id);
    let key: &Key = &file.partition.key;
    let request = BlockRequest {
        volume_offset: file.volume_base_offset,
        cluster_offset: file.cluster_data_offset,
        file_offset: file.offset_in_cluster + offset,
        length,
    };

    match file.hash_mode() {
        HashMode::Hashed => engine::decrypt_hashed(reader, key, &iv, cluster_id, &request, out),
        HashMode::Unhashed => engine::decrypt_unhashed(reader, key, &iv, &request, out),
    }
}

/// Read a byte range of `file` into memory, clamped to the file size.
pub fn read_file_range<R: Read + Seek>(
    reader: &mut ImageReader<R>,
    file: &File<'_>,
    offset: u64,
    length: u64,
) -> Result<Vec<u8>, WudError> {
    let length = length.min(file.size.saturating_sub(offset));
    let mut buf = Vec::with_capacity(length as usize);
    decrypt_file_to(reader, file, offset, length, &mut buf)?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Tree walk
// ---------------------------------------------------------------------------

/// Writes a partition's tree below an output directory.
///
/// Failures are per file: they are logged, counted in the summary and the
/// walk moves on.
pub struct Extractor<'a> {
    output_dir: &'a Path,
    options: &'a ExtractOptions,
    progress: Option<&'a Sender<ExtractProgress>>,
    summary: &'a mut ExtractSummary,
}

impl<'a> Extractor<'a> {
    pub fn new(
        output_dir: &'a Path,
        options: &'a ExtractOptions,
        progress: Option<&'a Sender<ExtractProgress>>,
        summary: &'a mut ExtractSummary,
    ) -> Self {
        Self {
            output_dir,
            options,
            progress,
            summary,
        }
    }

    fn send(&self, event: ExtractProgress) {
        if let Some(tx) = self.progress {
            let _ = tx.send(event);
        }
    }

    /// Files of `dir` first, then each subdirectory, depth-first.
    pub fn extract_directory<R: Read + Seek>(
        &mut self,
        reader: &mut ImageReader<R>,
        dir: &Directory<'_>,
    ) {
        let dir_path = dir.path();
        if !self.options.dry_run {
            let target = self.output_dir.join(&dir_path);
            if let Err(e) = fs::create_dir_all(&target) {
                log::error!("Cannot create directory {}: {}", target.display(), e);
            }
        }

        for file in &dir.files {
            self.extract_file(reader, file);
        }
        for child in &dir.directories {
            self.extract_directory(reader, child);
        }
    }

    fn extract_file<R: Read + Seek>(&mut self, reader: &mut ImageReader<R>, file: &File<'_>) {
        let path = file.path();

        if self.options.dry_run {
            log::info!("{} ({} bytes, {:?})", path, file.size, file.hash_mode());
            self.summary.files_written += 1;
            self.send(ExtractProgress::file_done(path, file.size));
            return;
        }

        log::debug!("Extracting {} ({} bytes)", path, file.size);
        let target = self.output_dir.join(&path);
        let handle = match fs::File::create(&target) {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Cannot create {}: {}", target.display(), e);
                self.summary.files_failed += 1;
                return;
            }
        };
        let mut out = BufWriter::new(handle);

        let mut report = match decrypt_file_to(reader, file, 0, file.size, &mut out) {
            Ok(report) => report,
            Err(e) => {
                log::error!("Failed to extract {}: {}", path, e);
                self.summary.files_failed += 1;
                return;
            }
        };
        if let Err(e) = out.flush() {
            log::warn!("Could not flush {}: {}", target.display(), e);
            report.write_failures += 1;
        }

        if report.hash_mismatches > 0 {
            log::warn!(
                "{}: {} hashed block(s) failed SHA-1 verification",
                path,
                report.hash_mismatches
            );
            self.summary.files_with_hash_mismatch += 1;
            self.summary.hash_mismatches += report.hash_mismatches as u64;
        }
        if report.write_failures > 0 {
            self.summary.files_failed += 1;
        } else {
            self.summary.files_written += 1;
        }
        self.summary.bytes_written += report.bytes_written;
        self.send(ExtractProgress::file_done(path, report.bytes_written));
    }
}
