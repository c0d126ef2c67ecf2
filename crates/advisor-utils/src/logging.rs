//! Logging and tracing utilities

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// HTTP client crates that are far too chatty below `warn`
const QUIET_TARGETS: &[&str] = &["reqwest", "hyper", "hyper_util", "h2", "rustls"];

/// Initialize a console subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize a subscriber that writes only to a timestamped file in `log_dir`
///
/// The file is named `investment_advisor_<YYYYmmdd_HHMMSS>.log`. `RUST_LOG`
/// still wins over `level` when set. Returns the path of the log file.
pub fn init_file_tracing(log_dir: &Path, level: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;

    let path = log_dir.join(log_file_name(chrono::Local::now()));
    let file = Arc::new(File::create(&path)?);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file),
        )
        .try_init()
        .map_err(io::Error::other)?;

    Ok(path)
}

/// Log file name for a run started at `now`
pub fn log_file_name<Tz: chrono::TimeZone>(now: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("investment_advisor_{}.log", now.format("%Y%m%d_%H%M%S"))
}

/// Filter directive for `level` with the HTTP stack capped at `warn`
pub fn filter_directive(level: &str) -> String {
    let level = match level.trim().to_ascii_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => l.to_string(),
        "warning" => "warn".to_string(),
        _ => "info".to_string(),
    };

    QUIET_TARGETS
        .iter()
        .fold(level, |acc, target| format!("{acc},{target}=warn"))
}
