//! Process-wide tracing setup

use crate::utils::config::LoggingSettings;
use anyhow::{Context, Result};
use chrono::Local;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Maps a configured level name (`INFO`, `debug`, `warning`...) to a filter
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" | "warning" => LevelFilter::WARN,
        "error" | "critical" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Installs the global subscriber.
///
/// Call once at startup. Returns the log file path when file output is on.
pub fn init_logging(settings: &LoggingSettings) -> Result<Option<PathBuf>> {
    let (file_layer, log_path) = if settings.file_enabled {
        std::fs::create_dir_all(&settings.log_dir)
            .with_context(|| format!("Creating {}", settings.log_dir.display()))?;
        let path = settings.log_dir.join(format!(
            "clipharvest_{}.log",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        let file = File::create(&path).with_context(|| format!("Creating {}", path.display()))?;
        let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
        (Some(layer), Some(path))
    } else {
        (None, None)
    };

    let console_layer = settings
        .console_enabled
        .then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(parse_level(&settings.level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Logging was already initialized")?;

    Ok(log_path)
}
