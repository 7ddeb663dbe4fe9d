// src/logging.rs

//! Logging setup for `backup-guard` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `BACKUP_GUARD_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Events go to STDERR and, for real runs, to a daily-rotated file in
//! `<backup_directory>/logs/`. The returned [`LoggingGuard`] must be kept
//! alive until exit so buffered file output is flushed.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::LogLevel;

/// Daily files kept, four weeks of history.
const MAX_LOG_FILES: usize = 28;

/// Keeps the non-blocking file writer alive.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Where the log file lives: directory plus file name prefix.
#[derive(Debug, Clone, Copy)]
pub struct LogFile<'a> {
    pub dir: &'a Path,
    pub name: &'a str,
}

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>, file: Option<LogFile<'_>>) -> Result<LoggingGuard> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("BACKUP_GUARD_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    let (file_layer, file_guard) = match file {
        Some(file) => {
            let appender = file_appender(file)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing the tracing subscriber")?;

    Ok(LoggingGuard { _file: file_guard })
}

fn file_appender(file: LogFile<'_>) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(file.dir)
        .with_context(|| format!("creating log directory {:?}", file.dir))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file.name)
        .max_log_files(MAX_LOG_FILES)
        .build(file.dir)
        .with_context(|| format!("opening log file {:?} in {:?}", file.name, file.dir))
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

/// Parse a level name as accepted in `BACKUP_GUARD_LOG`.
pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
