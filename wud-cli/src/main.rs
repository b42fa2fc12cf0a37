//! wud-extract CLI
//!
//! Command-line interface for decrypting and extracting Wii U disc images.

mod cli_types;
mod commands;
mod error;
mod logger;
mod spinner;

use std::process::ExitCode;

use clap::Parser;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

use cli_types::Cli;
pub(crate) use error::CliError;
pub(crate) use logger::log_blank;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logger::init(cli.quiet, cli.verbose, cli.logfile.as_deref()) {
        eprintln!("wud-extract: {}", e);
        return ExitCode::FAILURE;
    }

    let result = if cli.info {
        commands::info::run_info(&cli)
    } else {
        commands::extract::run_extract(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{} {}",
                "error:".if_supports_color(Stderr, |t| t.red()),
                e
            );
            ExitCode::FAILURE
        }
    }
}

/// Format a byte size as a human-readable string.
pub(crate) fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{} KB", bytes / KB)
    } else {
        format!("{} bytes", bytes)
    }
}
