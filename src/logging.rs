use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::model::config::LogConfig;

static GUARD: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();

/// Log to a daily file in the data directory, never to stdout: the
/// terminal belongs to the menu and to pip.
pub fn init(config: &LogConfig) -> Result<()> {
    let log_dir = directories::ProjectDirs::from("", "", "offpkg")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "offpkg.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_new(&config.filter)?)
        .init();

    let _ = GUARD.set(Mutex::new(Some(guard)));
    Ok(())
}

/// Drain buffered log lines. Needed before `process::exit`, which skips
/// destructors.
pub fn flush() {
    if let Some(slot) = GUARD.get() {
        if let Ok(mut guard) = slot.lock() {
            guard.take();
        }
    }
}
