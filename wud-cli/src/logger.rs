//! Console logger with an optional plain-text copy on disk.
//!
//! Library code only talks to the `log` facade. Here two `env_logger`
//! loggers render records: info and debug go to stdout, warnings and errors
//! to stderr. Level tags are coloured with `owo-colors`, and every line is
//! also appended to `--logfile` with ANSI escapes stripped. While a spinner
//! is attached, each record is printed with the spinner suspended so the
//! two never share a terminal line.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use indicatif::ProgressBar;
use log::{Level, LevelFilter, Log, Metadata, Record};
use owo_colors::OwoColorize;
use owo_colors::Stream;

use crate::CliError;

/// Spinner currently drawing, if any.
static PROGRESS: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// Suspend `pb` around every log record until [`detach_progress`].
pub(crate) fn attach_progress(pb: &ProgressBar) {
    if let Ok(mut slot) = PROGRESS.lock() {
        *slot = Some(pb.clone());
    }
}

pub(crate) fn detach_progress() {
    if let Ok(mut slot) = PROGRESS.lock() {
        *slot = None;
    }
}

fn active_progress() -> Option<ProgressBar> {
    PROGRESS.lock().ok().and_then(|slot| slot.clone())
}

/// Warnings and errors are diagnostics and go to stderr.
fn is_diagnostic(level: Level) -> bool {
    level <= Level::Warn
}

/// Writes to one console stream and, if configured, to a shared log file
/// without colour codes.
struct Tee {
    stream: Stream,
    file: Option<Arc<Mutex<File>>>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stream {
            Stream::Stderr => io::stderr().write_all(buf)?,
            _ => io::stdout().write_all(buf)?,
        }
        if let Some(file) = &self.file {
            let mut file = file
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?;
            file.write_all(&strip_ansi_escapes::strip(buf))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream {
            Stream::Stderr => io::stderr().flush()?,
            _ => io::stdout().flush()?,
        }
        if let Some(file) = &self.file {
            let mut file = file
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?;
            file.flush()?;
        }
        Ok(())
    }
}

/// Routes each record to the stdout or stderr logger.
struct ConsoleLogger {
    stdout: env_logger::Logger,
    stderr: env_logger::Logger,
}

impl ConsoleLogger {
    fn sink(&self, level: Level) -> &env_logger::Logger {
        if is_diagnostic(level) {
            &self.stderr
        } else {
            &self.stdout
        }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.sink(metadata.level()).enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        let sink = self.sink(record.level());
        if !sink.matches(record) {
            return;
        }
        match active_progress() {
            Some(pb) => pb.suspend(|| sink.log(record)),
            None => sink.log(record),
        }
    }

    fn flush(&self) {
        self.stdout.flush();
        self.stderr.flush();
    }
}

fn level_filter(quiet: bool, verbose: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Warn
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn build_logger(
    quiet: bool,
    verbose: bool,
    stream: Stream,
    file: Option<Arc<Mutex<File>>>,
) -> env_logger::Logger {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level_filter(quiet, verbose))
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(Tee { stream, file })))
        .format(move |buf, record| {
            let tag = match record.level() {
                Level::Error => Some(format!(
                    "{} ",
                    "error:".if_supports_color(stream, |t| t.red())
                )),
                Level::Warn => Some(format!(
                    "{} ",
                    "warning:".if_supports_color(stream, |t| t.yellow())
                )),
                Level::Info => None,
                Level::Debug | Level::Trace => Some(format!(
                    "{} ",
                    format!("[{}]", record.target()).if_supports_color(stream, |t| t.dimmed())
                )),
            };
            let tag = tag.unwrap_or_default();
            if verbose {
                writeln!(buf, "{} {}{}", buf.timestamp_millis(), tag, record.args())
            } else {
                writeln!(buf, "{}{}", tag, record.args())
            }
        });
    builder.build()
}

/// Install the global logger. `RUST_LOG` overrides the flag-derived level.
pub(crate) fn init(quiet: bool, verbose: bool, logfile: Option<&Path>) -> Result<(), CliError> {
    let file = match logfile {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            Some(Arc::new(Mutex::new(File::create(path)?)))
        }
        None => None,
    };

    let stdout = build_logger(quiet, verbose, Stream::Stdout, file.clone());
    let stderr = build_logger(quiet, verbose, Stream::Stderr, file);
    let max_level = stdout.filter().max(stderr.filter());

    log::set_boxed_logger(Box::new(ConsoleLogger { stdout, stderr }))
        .map_err(|e| CliError::logger(e.to_string()))?;
    log::set_max_level(max_level);
    Ok(())
}

/// Log an empty line at info level.
pub(crate) fn log_blank() {
    log::info!("");
}
