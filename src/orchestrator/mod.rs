//! Keyword and batch orchestration

pub mod report;
pub mod runner;
pub mod stats;
pub mod status;

pub use report::ReportWriter;
pub use runner::{Orchestrator, OrchestratorConfig};
pub use stats::{BatchStats, KeywordStats, VideoSummary};
pub use status::{scan_status, DownloadStatusReport, KeywordFileCounts};
