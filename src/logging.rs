//! Tracing setup: console output plus an optional log file.

use chrono::Local;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Builds the log file path `<dir>/<name>_<YYYYmmdd_HHMMSS>.log`.
pub fn log_file_path(dir: &Path, name: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.log", name, stamp))
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_filter`. When `log_dir` is set, events are
/// also appended, without colors, to a timestamped file named after `name`.
/// Returns the log file path, if any.
pub fn init(
    default_filter: &str,
    log_dir: Option<&Path>,
    name: &str,
) -> std::io::Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (file_layer, path) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = log_file_path(dir, name);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(path)
}
