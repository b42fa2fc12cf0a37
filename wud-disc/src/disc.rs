//! Whole-image operations: open, list, collect keys, extract.

use std::fs;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::mpsc::Sender;

use wud_core::crypto::Key;
use wud_core::util::is_safe_component;
use wud_core::{ExtractOptions, ExtractProgress, WudError};

use crate::extract::Extractor;
use crate::header::DiscHeader;
use crate::image::ImageReader;
use crate::partition::{self, Partition, PartitionKind};
use crate::titlekey::{self, TitleKeySet};
use crate::toc::{self, PartitionTableEntry};
use crate::tree;

/// Totals for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub title_keys: usize,
    pub partitions_extracted: usize,
    pub partitions_skipped: usize,
    /// Files written (or listed, in dry-run mode).
    pub files_written: usize,
    pub files_failed: usize,
    pub files_with_hash_mismatch: usize,
    pub hash_mismatches: u64,
    pub bytes_written: u64,
}

/// An opened WUD image with its header and partition table decoded.
pub struct WudImage<R> {
    reader: ImageReader<R>,
    disc_key: Key,
    header: DiscHeader,
    partitions: Vec<PartitionTableEntry>,
}

impl WudImage<BufReader<fs::File>> {
    /// Open an image file.
    pub fn open(path: &Path, disc_key: &Key) -> Result<Self, WudError> {
        let file = fs::File::open(path)?;
        Self::from_reader(BufReader::new(file), disc_key)
    }
}

impl<R: Read + Seek> WudImage<R> {
    /// Read the clear header and decrypt the partition table.
    ///
    /// Both failures are fatal for the whole image.
    pub fn from_reader(inner: R, disc_key: &Key) -> Result<Self, WudError> {
        let mut reader = ImageReader::new(inner);
        let header = DiscHeader::read(&mut reader)?;
        log::info!(
            "{} rev {} (system {}, {})",
            header.serial,
            header.revision,
            header.system_version_dotted(),
            header.region.name()
        );
        let partitions = toc::read_partition_table(&mut reader, disc_key)?;
        Ok(Self {
            reader,
            disc_key: *disc_key,
            header,
            partitions,
        })
    }

    pub fn header(&self) -> &DiscHeader {
        &self.header
    }

    pub fn partitions(&self) -> &[PartitionTableEntry] {
        &self.partitions
    }

    /// Reads issued against the image so far.
    pub fn read_count(&self) -> u64 {
        self.reader.read_count()
    }

    /// Scan every ticket-carrying partition for `TITLE.TIK` and unwrap the
    /// title keys with the common key.
    pub fn collect_title_keys(&mut self, common_key: &Key) -> TitleKeySet {
        let mut keys = TitleKeySet::new();
        for index in 0..self.partitions.len() {
            let entry = &self.partitions[index];
            if !PartitionKind::from_name(&entry.name).carries_tickets() {
                continue;
            }
            let entry = entry.clone();
            match Partition::load(&mut self.reader, &entry, &self.disc_key) {
                Ok(partition) => {
                    titlekey::collect_from_partition(
                        &mut self.reader,
                        &partition,
                        common_key,
                        &mut keys,
                    );
                }
                Err(e) => log::error!("{}: cannot scan for tickets: {}", entry.name, e),
            }
        }
        log::info!("Found {} title key(s)", keys.len());
        keys
    }

    /// Resolve the key for partition `index` and decode its file table.
    pub fn load_partition(
        &mut self,
        index: usize,
        title_keys: &TitleKeySet,
    ) -> Result<Partition, WudError> {
        let entry = self.partitions.get(index).cloned().ok_or_else(|| {
            WudError::invalid_image(format!("no partition at index {}", index))
        })?;
        let key = partition::resolve_key(&entry, title_keys, &self.disc_key)
            .ok_or_else(|| WudError::MissingKey(entry.name.clone()))?;
        Partition::load(&mut self.reader, &entry, &key)
    }

    /// Extract every partition (or the filtered ones) below `output_dir`.
    ///
    /// Title keys are always collected from every ticket partition, even
    /// when the filter excludes them. Per-partition and per-file problems
    /// are logged and counted; only fatal errors are returned.
    pub fn extract(
        &mut self,
        output_dir: &Path,
        common_key: &Key,
        options: &ExtractOptions,
        progress: Option<&Sender<ExtractProgress>>,
    ) -> Result<ExtractSummary, WudError> {
        let send = |event: ExtractProgress| {
            if let Some(tx) = progress {
                let _ = tx.send(event);
            }
        };

        let title_keys = self.collect_title_keys(common_key);
        let mut summary = ExtractSummary {
            title_keys: title_keys.len(),
            ..Default::default()
        };
        send(ExtractProgress::TitleKeys {
            count: title_keys.len(),
        });

        if !options.dry_run {
            fs::create_dir_all(output_dir)?;
        }

        let total = self.partitions.len();
        for index in 0..total {
            let name = self.partitions[index].name.clone();
            if !options.accepts_partition(&name) {
                log::debug!("{}: filtered out", name);
                summary.partitions_skipped += 1;
                send(ExtractProgress::partition_skipped(&name, "filtered out"));
                continue;
            }
            if !is_safe_component(&name) {
                log::error!("{:?}: not usable as a directory name, skipping partition", name);
                summary.partitions_skipped += 1;
                send(ExtractProgress::partition_skipped(&name, "unsafe partition name"));
                continue;
            }

            let partition = match self.load_partition(index, &title_keys) {
                Ok(partition) => partition,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    match &e {
                        WudError::MissingKey(_) => {
                            log::warn!("{}: no title key or disc key applies, skipping", name)
                        }
                        _ => log::error!("{}: {}", name, e),
                    }
                    summary.partitions_skipped += 1;
                    send(ExtractProgress::partition_skipped(&name, e.to_string()));
                    continue;
                }
            };

            log::info!(
                "Extracting partition {} ({} entries, {} bytes)",
                partition.name,
                partition.total_entries(),
                partition.content_size()
            );
            send(ExtractProgress::partition_started(&name, index, total));

            let root = tree::build_tree(&partition, "");
            Extractor::new(output_dir, options, progress, &mut summary)
                .extract_directory(&mut self.reader, &root);
            summary.partitions_extracted += 1;
        }

        send(ExtractProgress::Completed);
        log::info!(
            "Done: {} file(s), {} bytes from {} partition(s); {} failed, {} with hash warnings",
            summary.files_written,
            summary.bytes_written,
            summary.partitions_extracted,
            summary.files_failed,
            summary.files_with_hash_mismatch
        );
        Ok(summary)
    }
}
