use thiserror::Error;

use wud_core::WudError;

/// Errors that end a CLI run with a nonzero exit status.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Image, key or partition table error
    #[error("{0}")]
    Wud(#[from] WudError),

    /// Logger setup failed
    #[error("Logger error: {0}")]
    Logger(String),

    /// The extraction thread died
    #[error("Worker error: {0}")]
    Worker(String),
}

impl CliError {
    pub(crate) fn logger(msg: impl Into<String>) -> Self {
        Self::Logger(msg.into())
    }

    pub(crate) fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }
}
