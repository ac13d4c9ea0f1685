//! Batch report persistence

use crate::orchestrator::stats::BatchStats;
use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Subdirectory of the download root holding reports
pub const REPORTS_DIR: &str = "reports";

/// Writes and reads `download_report_{YYYYMMDD_HHMMSS}.json` files
#[derive(Debug, Clone)]
pub struct ReportWriter {
    reports_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(download_dir: &Path) -> Self {
        Self {
            reports_dir: download_dir.join(REPORTS_DIR),
        }
    }

    /// Serialize `stats` as pretty JSON under a fresh timestamped name
    pub async fn save(&self, stats: &BatchStats) -> Result<PathBuf> {
        fs::create_dir_all(&self.reports_dir)
            .await
            .context("Failed to create reports directory")?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let report_path = self
            .reports_dir
            .join(format!("download_report_{}.json", timestamp));

        let json = serde_json::to_string_pretty(stats).context("Failed to serialize report")?;

        let mut file = fs::File::create(&report_path)
            .await
            .context("Failed to create report file")?;
        file.write_all(json.as_bytes())
            .await
            .context("Failed to write report")?;
        file.flush().await?;

        info!("Download report saved: {}", report_path.display());
        Ok(report_path)
    }

    pub async fn load(&self, path: &Path) -> Result<BatchStats> {
        let json = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read report {}", path.display()))?;
        serde_json::from_str(&json).context("Failed to deserialize report")
    }

    /// Report files, oldest first
    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        let mut reports = Vec::new();
        if !fs::try_exists(&self.reports_dir).await.unwrap_or(false) {
            return Ok(reports);
        }

        let mut entries = fs::read_dir(&self.reports_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_report = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("download_report_") && n.ends_with(".json"));
            if is_report {
                reports.push(path);
            }
        }
        // Timestamped names sort chronologically
        reports.sort();
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::stats::KeywordStats;

    #[tokio::test]
    async fn test_save_and_load_report() {
        let temp = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(temp.path());

        let mut stats = BatchStats::new(vec!["sunset".into()]);
        stats.record_completed(KeywordStats::new("sunset"));
        stats.finish();

        let path = writer.save(&stats).await.unwrap();
        assert!(path.starts_with(temp.path().join(REPORTS_DIR)));

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("download_report_"));
        assert_eq!(name.len(), "download_report_YYYYMMDD_HHMMSS.json".len());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"keywords\""), "report is pretty-printed");

        assert_eq!(writer.load(&path).await.unwrap(), stats);
        assert_eq!(writer.list().await.unwrap(), vec![path]);
    }

    #[tokio::test]
    async fn test_list_without_reports_dir() {
        let temp = tempfile::tempdir().unwrap();
        assert!(ReportWriter::new(temp.path()).list().await.unwrap().is_empty());
    }
}
