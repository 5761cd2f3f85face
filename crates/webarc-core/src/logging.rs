//! Logging bootstrap for the webarc binaries.
//!
//! Events are appended to `webarc.log` under the XDG state directory
//! (`~/.local/state/webarc/` on a default setup), falling back to stderr
//! when the file cannot be opened. Set `WEBARC_LOG` to override the
//! default filter.

use std::fs::{File, OpenOptions};
use std::io::{self, Stderr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const FILTER_ENV: &str = "WEBARC_LOG";
const DEFAULT_FILTER: &str = "info,webarc=debug";

/// Destination handed to the subscriber for each event.
enum LogSink {
    File(File),
    Stderr(Stderr),
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(file) => file.write(buf),
            LogSink::Stderr(stderr) => stderr.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(file) => file.flush(),
            LogSink::Stderr(stderr) => stderr.flush(),
        }
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn open_log_file() -> Result<(PathBuf, File)> {
    let dirs =
        xdg::BaseDirectories::with_prefix("webarc").context("locate XDG base directories")?;
    let path = dirs
        .place_state_file("webarc.log")
        .context("create state directory for webarc.log")?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    Ok((path, file))
}

/// Install the global subscriber. Never fails: when the state-directory
/// log file is unavailable the subscriber writes to stderr instead.
pub fn init() {
    match open_log_file() {
        Ok((path, file)) => {
            let sink = move || match file.try_clone() {
                Ok(clone) => LogSink::File(clone),
                Err(_) => LogSink::Stderr(io::stderr()),
            };
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(sink)
                .with_ansi(false)
                .init();
            tracing::info!(log_file = %path.display(), "logging to state directory");
        }
        Err(err) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(io::stderr)
                .with_ansi(true)
                .init();
            tracing::warn!("file logging unavailable ({err:#}), writing to stderr");
        }
    }
}
