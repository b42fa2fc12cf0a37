//! Shared building blocks for WUD (Wii U disc image) extraction: byte codec,
//! error taxonomy, key loading, AES/SHA-1 primitives and extraction options.

pub mod crypto;
pub mod error;
pub mod keys;
pub mod progress;
pub mod region;
pub mod util;

pub use crypto::{Iv, Key};
pub use error::WudError;
pub use keys::load_key;
pub use progress::ExtractProgress;
pub use region::Region;

/// Options that control how an image is extracted.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Only extract partitions whose two-letter type code matches
    /// (case-insensitive), e.g. `"GM"`.
    pub partition_filter: Option<String>,

    /// Walk every partition and report the files without writing anything.
    pub dry_run: bool,
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition_filter(mut self, code: impl Into<String>) -> Self {
        self.partition_filter = Some(code.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Whether a partition with the given name passes the filter.
    pub fn accepts_partition(&self, name: &str) -> bool {
        match &self.partition_filter {
            None => true,
            Some(filter) => {
                let code: String = name.chars().take(2).collect();
                let wanted: String = filter.trim().chars().take(2).collect();
                code.eq_ignore_ascii_case(&wanted)
            }
        }
    }
}
