//! Download engine module

pub mod engine;
pub mod progress;
pub mod retry;

// Re-export for convenience
pub use engine::{DownloadConfig, DownloadEngine, FetchOutcome, MediaFetcher};
pub use progress::{DownloadProgress, DownloadStatus};
pub use retry::retry_async;
