//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "wud-extract")]
#[command(about = "Decrypt and extract Wii U disc images (WUD)", long_about = None)]
pub(crate) struct Cli {
    /// WUD image to read
    pub image: PathBuf,

    /// Directory to extract into (one subdirectory per partition)
    pub output_dir: PathBuf,

    /// Common key file (16 raw bytes or 32 hex digits)
    pub common_key: PathBuf,

    /// Disc key file (16 raw bytes or 32 hex digits)
    pub disc_key: PathBuf,

    /// Only extract partitions of this type (e.g. GM, SI, UP, GI)
    pub partition_filter: Option<String>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long)]
    pub verbose: bool,

    /// Write log output to a file (ANSI codes stripped)
    #[arg(long)]
    pub logfile: Option<PathBuf>,

    /// List the files that would be extracted without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the disc header, partition table and title keys, then exit
    #[arg(long)]
    pub info: bool,
}
