/// Progress updates sent while an image is being extracted.
///
/// Extraction runs synchronously; a frontend that wants live feedback runs it
/// on a worker thread and drains these from an `mpsc` channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractProgress {
    /// Title keys have been collected from the ticket partitions
    TitleKeys { count: usize },
    /// A partition is about to be walked
    PartitionStarted {
        name: String,
        index: usize,
        total: usize,
    },
    /// A partition was skipped (no key, filtered out, or bad file table)
    PartitionSkipped { name: String, reason: String },
    /// A file has been written (or listed, in dry-run mode)
    FileDone { path: String, bytes: u64 },
    /// Extraction has finished
    Completed,
}

impl ExtractProgress {
    pub fn partition_started(name: impl Into<String>, index: usize, total: usize) -> Self {
        Self::PartitionStarted {
            name: name.into(),
            index,
            total,
        }
    }

    pub fn partition_skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PartitionSkipped {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn file_done(path: impl Into<String>, bytes: u64) -> Self {
        Self::FileDone {
            path: path.into(),
            bytes,
        }
    }
}
