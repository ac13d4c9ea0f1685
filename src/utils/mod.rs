//! Utility modules for error handling, configuration, logging and naming

pub mod config;
pub mod error;
pub mod logging;
pub mod naming;

// Re-export for convenience
pub use config::{AppSettings, ApiSettings, DownloadSettings, LoggingSettings, SearchSettings};
pub use error::ScraperError;
pub use naming::{format_duration, format_file_size, safe_path, sanitize_filename};
