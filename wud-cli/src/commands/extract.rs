use std::sync::mpsc;
use std::thread;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use wud_core::{ExtractOptions, WudError, load_key};
use wud_disc::{ExtractSummary, WudImage};

use crate::cli_types::Cli;
use crate::spinner::ExtractSpinner;
use crate::{CliError, format_bytes};

/// Run a full (or dry-run) extraction.
///
/// The image is processed on a worker thread; this thread only renders
/// progress events until the worker drops its sender.
pub(crate) fn run_extract(cli: &Cli) -> Result<(), CliError> {
    let common_key = load_key(&cli.common_key)?;
    let disc_key = load_key(&cli.disc_key)?;

    let mut options = ExtractOptions::new().dry_run(cli.dry_run);
    if let Some(filter) = &cli.partition_filter {
        options = options.partition_filter(filter.as_str());
    }

    log::info!(
        "Extracting {} to {}",
        cli.image.display(),
        cli.output_dir.display()
    );
    if cli.dry_run {
        log::info!("Dry run: nothing will be written");
    }
    if let Some(filter) = &options.partition_filter {
        log::info!("Partition filter: {}", filter);
    }

    let image_path = cli.image.clone();
    let output_dir = cli.output_dir.clone();
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || -> Result<ExtractSummary, WudError> {
        let mut image = WudImage::open(&image_path, &disc_key)?;
        image.extract(&output_dir, &common_key, &options, Some(&tx))
    });

    let mut spinner = ExtractSpinner::new(cli.quiet);
    for event in rx {
        spinner.handle(&event);
    }
    spinner.finish();

    let summary = worker
        .join()
        .map_err(|_| CliError::worker("extraction thread panicked"))??;
    print_summary(&summary, cli.dry_run);
    Ok(())
}

fn print_summary(summary: &ExtractSummary, dry_run: bool) {
    crate::log_blank();
    let verb = if dry_run { "Listed" } else { "Extracted" };
    log::info!(
        "{} {} file(s) ({}) from {} partition(s)",
        verb.if_supports_color(Stdout, |t| t.green()),
        summary.files_written,
        format_bytes(summary.bytes_written),
        summary.partitions_extracted,
    );
    log::info!("Title keys found: {}", summary.title_keys);
    if summary.partitions_skipped > 0 {
        log::info!(
            "{}",
            format!("Partitions skipped: {}", summary.partitions_skipped)
                .if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    if summary.files_with_hash_mismatch > 0 {
        log::warn!(
            "{} file(s) had {} hashed block(s) fail verification",
            summary.files_with_hash_mismatch,
            summary.hash_mismatches
        );
    }
    if summary.files_failed > 0 {
        log::warn!(
            "{} file(s) could not be written",
            summary.files_failed.if_supports_color(Stdout, |t| t.red())
        );
    }
}
