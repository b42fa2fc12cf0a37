//! Live progress line for an extraction running on a worker thread.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use wud_core::ExtractProgress;

use crate::format_bytes;

/// A single spinner fed from [`ExtractProgress`] events.
pub(crate) struct ExtractSpinner {
    pb: ProgressBar,
    position: (usize, usize),
    files: usize,
    bytes: u64,
}

impl ExtractSpinner {
    /// When `quiet` is true the spinner is hidden.
    pub(crate) fn new(quiet: bool) -> Self {
        let pb = if quiet {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
        } else {
            ProgressBar::new_spinner()
        };
        let style = ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("/-\\|");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Reading partition table...");
        crate::logger::attach_progress(&pb);

        Self {
            pb,
            position: (0, 0),
            files: 0,
            bytes: 0,
        }
    }

    pub(crate) fn handle(&mut self, event: &ExtractProgress) {
        match event {
            ExtractProgress::TitleKeys { count } => {
                self.pb.set_message(format!("Found {} title key(s)", count));
            }
            ExtractProgress::PartitionStarted { name, index, total } => {
                self.position = (index + 1, *total);
                self.pb.set_message(format!(
                    "[{}/{}] {}",
                    self.position.0, self.position.1, name
                ));
            }
            ExtractProgress::PartitionSkipped { name, .. } => {
                self.pb.set_message(format!("Skipped {}", name));
            }
            ExtractProgress::FileDone { path, bytes } => {
                self.files += 1;
                self.bytes += bytes;
                self.pb.set_message(format!(
                    "[{}/{}] {} files, {}: {}",
                    self.position.0,
                    self.position.1,
                    self.files,
                    format_bytes(self.bytes),
                    path
                ));
            }
            ExtractProgress::Completed => self.finish(),
        }
    }

    /// Stop ticking, clear the line and stop suspending it for log output.
    pub(crate) fn finish(&self) {
        crate::logger::detach_progress();
        self.pb.disable_steady_tick();
        self.pb.finish_and_clear();
    }
}
