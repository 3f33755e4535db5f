use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::formatter::BracketedFormatter;

/// Install the global subscriber.
///
/// Events go to stdout and, when `log_dir` is given, also to a fresh
/// timestamped file inside it. `RUST_LOG` takes precedence over `level`.
///
/// # Returns
/// * `Ok(Some(path))` with the log file path when file logging is enabled
/// * `Ok(None)` when logging to stdout only
/// * `Err` if the log file cannot be created or a subscriber is already set
pub fn setup_logging(level: &str, log_dir: Option<&Path>) -> io::Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, log_path) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;

            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            let log_path = dir.join(format!("dataset_prep_{}.log", timestamp));
            let file = fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&log_path)?;

            let layer = fmt::layer()
                .event_format(BracketedFormatter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false);
            (Some(layer), Some(log_path))
        }
        None => (None, None),
    };

    let stdout_layer = fmt::layer()
        .event_format(BracketedFormatter)
        .with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    if let Some(path) = &log_path {
        info!("Log file created at: {:?}", path);
    }
    Ok(log_path)
}
