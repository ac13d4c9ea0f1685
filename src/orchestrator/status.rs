//! On-disk summary of what has been downloaded so far

use crate::orchestrator::report::REPORTS_DIR;
use crate::utils::naming::{format_file_size, COVER_SUFFIX, VIDEO_SUFFIX};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File counts of one keyword directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeywordFileCounts {
    pub videos: usize,
    pub covers: usize,
    pub total_files: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadStatusReport {
    /// The download root does not exist yet
    NotStarted,
    Active {
        total_files: usize,
        total_size: String,
        total_size_bytes: u64,
        keyword_stats: BTreeMap<String, KeywordFileCounts>,
        download_dir: PathBuf,
    },
}

/// Walks the immediate subdirectories of `download_dir` (except `reports`)
pub async fn scan_status(download_dir: &Path) -> io::Result<DownloadStatusReport> {
    if !fs::try_exists(download_dir).await? {
        return Ok(DownloadStatusReport::NotStarted);
    }

    let mut keyword_stats = BTreeMap::new();
    let mut total_files = 0;
    let mut total_size_bytes = 0u64;

    let mut entries = fs::read_dir(download_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == REPORTS_DIR || !entry.file_type().await?.is_dir() {
            continue;
        }

        let (counts, size) = scan_keyword_dir(&entry.path()).await?;
        total_files += counts.total_files;
        total_size_bytes += size;
        keyword_stats.insert(name, counts);
    }

    Ok(DownloadStatusReport::Active {
        total_files,
        total_size: format_file_size(total_size_bytes),
        total_size_bytes,
        keyword_stats,
        download_dir: download_dir.to_path_buf(),
    })
}

async fn scan_keyword_dir(dir: &Path) -> io::Result<(KeywordFileCounts, u64)> {
    let mut counts = KeywordFileCounts::default();
    let mut size = 0u64;

    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        size += metadata.len();

        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(VIDEO_SUFFIX) {
            counts.videos += 1;
        } else if name.ends_with(COVER_SUFFIX) {
            counts.covers += 1;
        }
    }

    counts.total_files = counts.videos + counts.covers;
    Ok((counts, size))
}
