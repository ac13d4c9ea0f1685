//! Download statistics for one keyword and for a whole batch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What is kept about a video once its download attempt is over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub title: String,
    pub author: String,
    pub duration: u64,
    pub success: bool,
}

/// Per-keyword accumulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordStats {
    pub keyword: String,
    pub total_found: usize,
    pub total_downloaded: usize,
    pub failed_downloads: usize,
    pub videos: Vec<VideoSummary>,
    /// Set when the keyword loop could not run at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KeywordStats {
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            total_found: 0,
            total_downloaded: 0,
            failed_downloads: 0,
            videos: Vec::new(),
            error: None,
        }
    }

    /// Zero-progress entry for a keyword that failed
    pub fn failed(keyword: &str, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(keyword)
        }
    }

    pub fn record(&mut self, summary: VideoSummary) {
        if summary.success {
            self.total_downloaded += 1;
        } else {
            self.failed_downloads += 1;
        }
        self.videos.push(summary);
    }
}

/// Accumulator across the keywords of one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub keywords: Vec<String>,
    pub total_keywords: usize,
    /// Keywords whose loop ran to the end without failing
    pub completed_keywords: usize,
    pub total_found: usize,
    pub total_downloaded: usize,
    pub total_failed: usize,
    pub keyword_stats: Vec<KeywordStats>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchStats {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            total_keywords: keywords.len(),
            keywords,
            completed_keywords: 0,
            total_found: 0,
            total_downloaded: 0,
            total_failed: 0,
            keyword_stats: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Merge a keyword whose loop completed
    pub fn record_completed(&mut self, stats: KeywordStats) {
        self.total_found += stats.total_found;
        self.total_downloaded += stats.total_downloaded;
        self.total_failed += stats.failed_downloads;
        self.completed_keywords += 1;
        self.keyword_stats.push(stats);
    }

    /// Keep a trace of a keyword that failed; counters are untouched
    pub fn record_failed(&mut self, keyword: &str, error: impl ToString) {
        self.keyword_stats.push(KeywordStats::failed(keyword, error));
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
