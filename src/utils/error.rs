//! Error handling for clipharvest

use thiserror::Error;

/// Main error type for clipharvest
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("Malformed API response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid keyword: {0:?}")]
    InvalidKeyword(String),

    #[error("No keywords to download")]
    NoKeywords,

    #[error("Unknown configuration key: {0}")]
    UnknownConfigKey(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidConfigValue { key: String, reason: String },

    #[error("Download failed: {0}")]
    DownloadError(String),
}

pub type Result<T> = std::result::Result<T, ScraperError>;
