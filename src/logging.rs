// src/logging.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::error::Result;

const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
const BACKUP_COUNT: usize = 3;

/// Install the global subscriber: a console layer (debug, `RUST_LOG`
/// overridable) plus an info-level file layer under a size-capped log file.
///
/// The returned guard must stay alive for the duration of the run; dropping
/// it flushes the file writer.
pub fn init(log_path: &Path) -> Result<WorkerGuard> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    rotate_if_oversized(log_path, MAX_LOG_BYTES, BACKUP_COUNT)?;

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(
            fmt::layer().with_writer(io::stdout).with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            ),
        )
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(LevelFilter::INFO),
        )
        .init();

    Ok(guard)
}

/// Shift `log -> log.1 -> log.2 -> ...` when the file exceeds `max_bytes`,
/// keeping at most `backups` old files. Each run logs a bounded amount, so
/// rotating once at startup keeps the cap honest.
fn rotate_if_oversized(path: &Path, max_bytes: u64, backups: usize) -> Result<()> {
    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => return Ok(()),
    };
    if len < max_bytes || backups == 0 {
        return Ok(());
    }

    let _ = fs::remove_file(backup_path(path, backups));
    for n in (1..backups).rev() {
        let from = backup_path(path, n);
        if from.exists() {
            fs::rename(&from, backup_path(path, n + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))?;
    Ok(())
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}
