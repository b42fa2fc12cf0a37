use thiserror::Error;

/// Errors that can occur while reading or extracting a WUD image.
///
/// Integrity mismatches and short reads/writes are not errors: they are
/// logged as warnings and extraction continues.
#[derive(Debug, Error)]
pub enum WudError {
    /// I/O error while reading the image or writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image header or partition table is unreadable or has a bad signature
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A partition's file table failed to decrypt or parse
    #[error("Invalid partition table in {partition}: {reason}")]
    InvalidPartitionTable { partition: String, reason: String },

    /// A key file could not be loaded
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The block cipher rejected its input
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// No disc key or title key applies to this partition
    #[error("No usable key for partition {0}")]
    MissingKey(String),
}

impl WudError {
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    pub fn invalid_partition_table(
        partition: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidPartitionTable {
            partition: partition.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    /// Whether this error should abort the whole run rather than one
    /// partition or file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidImage(_) | Self::InvalidKey(_))
    }
}
