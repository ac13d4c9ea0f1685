//! clipharvest library
//!
//! Searches a stock-footage catalogue by keyword and downloads the matching
//! clips, their covers and a JSON report of each batch.

pub mod app;
pub mod downloader;
pub mod extractor;
pub mod orchestrator;
pub mod utils;

// Re-export main types for easier use
pub use downloader::{DownloadConfig, DownloadEngine, FetchOutcome, MediaFetcher};
pub use extractor::{RecordExtractor, ResolutionPolicy, SearchApi, SearchClient, SearchPage, VideoRecord};
pub use orchestrator::{BatchStats, DownloadStatusReport, KeywordStats, Orchestrator, OrchestratorConfig};
pub use utils::{AppSettings, ScraperError};
