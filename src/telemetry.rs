//! Tracing setup.
//!
//! The terminal UI owns the screen, so interactive runs log to a file in
//! the user's data directory. Headless runs log to stderr.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

pub enum LogTarget<'a> {
    Stderr,
    File(Option<&'a Path>),
}

/// Default log file location.
pub fn default_log_path() -> PathBuf {
    match ProjectDirs::from("", "", "boombox") {
        Some(dirs) => dirs.data_dir().join("boombox.log"),
        None => std::env::temp_dir().join("boombox.log"),
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("boombox=info"))
        .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::INFO.into()))
}

pub fn init(target: LogTarget<'_>) -> Result<LogGuard> {
    match target {
        LogTarget::Stderr => {
            if let Err(err) = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
                .try_init()
            {
                eprintln!("[telemetry] failed to initialise tracing subscriber: {err}");
            }
            Ok(LogGuard { _guard: None })
        }
        LogTarget::File(path) => {
            let path = path.map(Path::to_path_buf).unwrap_or_else(default_log_path);
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create log directory {:?}", dir))?;
            }
            let file = File::create(&path)
                .with_context(|| format!("Failed to create log file {:?}", path))?;
            let (writer, guard) = tracing_appender::non_blocking(file);

            if let Err(err) = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
            {
                eprintln!("[telemetry] failed to initialise tracing subscriber: {err}");
            }
            Ok(LogGuard {
                _guard: Some(guard),
            })
        }
    }
}
