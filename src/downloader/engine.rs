//! Single-file download engine with retry and partial-file cleanup

use crate::downloader::progress::{DownloadProgress, DownloadStatus};
use crate::downloader::retry::retry_async;
use crate::utils::error::{Result, ScraperError};
use crate::utils::naming::format_duration;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Download configuration
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub chunk_size: usize,           // Write buffer size (default: 8192)
    pub retry_attempts: usize,       // Attempts per file (default: 3)
    pub retry_delay: Duration,       // Delay between attempts
    pub read_timeout: Duration,      // Longest wait for the response or the next chunk
    pub progress_interval: Duration, // How often progress is reported
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: 8192,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
            read_timeout: Duration::from_secs(300),
            progress_interval: Duration::from_secs(1),
        }
    }
}

/// What a fetch did to reach its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Transferred and written this many bytes
    Downloaded { bytes: u64 },
    /// The destination was already present; nothing was fetched
    Skipped,
}

/// Anything that can place the body of a URL at a path
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<FetchOutcome>;
}

/// Streaming HTTP downloader
pub struct DownloadEngine {
    client: Client,
    config: DownloadConfig,
}

impl DownloadEngine {
    /// Create a new engine over a shared client
    pub fn new(client: Client, config: DownloadConfig) -> Self {
        Self { client, config }
    }

    /// Download `url` to `output_path`.
    ///
    /// An existing `output_path` is returned as [`FetchOutcome::Skipped`]
    /// without touching the network. Every attempt starts from byte zero; the
    /// error of the last attempt is returned when all of them fail.
    pub async fn download(&self, url: &str, output_path: &Path) -> Result<FetchOutcome> {
        if fs::try_exists(output_path).await.unwrap_or(false) {
            info!("File already exists, skipping: {}", output_path.display());
            return Ok(FetchOutcome::Skipped);
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let label = format!("Download of {}", output_path.display());
        let bytes = retry_async(
            &label,
            self.config.retry_attempts,
            self.config.retry_delay,
            || self.download_attempt(url, output_path),
        )
        .await?;

        info!("Download completed: {} ({} bytes)", output_path.display(), bytes);
        Ok(FetchOutcome::Downloaded { bytes })
    }

    /// Single attempt; the partial file is removed unless the body was fully written
    async fn download_attempt(&self, url: &str, output_path: &Path) -> Result<u64> {
        let mut guard = PartialFile::new(output_path);
        let bytes = self.stream_to_file(url, output_path).await?;
        guard.commit();
        Ok(bytes)
    }

    async fn stream_to_file(&self, url: &str, output_path: &Path) -> Result<u64> {
        debug!("GET {}", url);
        let read_timeout = self.config.read_timeout;
        let response = timeout(read_timeout, self.client.get(url).send())
            .await
            .map_err(|_| stalled(read_timeout))??;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::HttpStatus(status));
        }

        let mut progress = DownloadProgress::new(response.content_length());
        let file = File::create(output_path).await?;
        let mut writer = BufWriter::with_capacity(self.config.chunk_size.max(1), file);
        let mut downloaded = 0u64;

        let start_time = Instant::now();
        let mut last_update_time = start_time;

        let mut stream = response.bytes_stream();
        // The deadline applies per read, so slow but steady transfers finish
        while let Some(chunk_result) = timeout(read_timeout, stream.next())
            .await
            .map_err(|_| stalled(read_timeout))?
        {
            let chunk = chunk_result?;
            writer.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            let now = Instant::now();
            if now.duration_since(last_update_time) >= self.config.progress_interval {
                let elapsed = now.duration_since(start_time).as_secs_f64();
                let speed = if elapsed > 0.0 { downloaded as f64 / elapsed } else { 0.0 };
                progress.update(downloaded, speed);
                report_progress(output_path, &progress);
                last_update_time = now;
            }
        }

        writer.flush().await?;

        if let Some(total) = progress.total_bytes {
            if downloaded < total {
                let message = format!("truncated body: {} of {} bytes", downloaded, total);
                progress.failed(message.clone());
                return Err(ScraperError::DownloadError(message));
            }
        }

        progress.update(downloaded, 0.0);
        progress.complete();
        report_progress(output_path, &progress);
        Ok(downloaded)
    }
}

#[async_trait]
impl MediaFetcher for DownloadEngine {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<FetchOutcome> {
        self.download(url, destination).await
    }
}

fn stalled(read_timeout: Duration) -> ScraperError {
    ScraperError::DownloadError(format!("no data received for {:?}", read_timeout))
}

fn report_progress(path: &Path, progress: &DownloadProgress) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match (&progress.status, progress.percentage()) {
        (DownloadStatus::Completed, _) => {
            debug!("{}: done, {} bytes", name, progress.downloaded_bytes)
        }
        (_, Some(pct)) => debug!(
            "{}: {:.1}% at {:.2} MB/s, ETA {}",
            name,
            pct * 100.0,
            progress.speed / 1024.0 / 1024.0,
            progress
                .eta
                .map(|eta| format_duration(eta.as_secs()))
                .unwrap_or_else(|| "--:--".to_string())
        ),
        (_, None) => debug!("{}: {} bytes", name, progress.downloaded_bytes),
    }
}

/// Removes the file at `path` when dropped, unless committed.
///
/// Covers both the error path and a download future dropped mid-write.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            committed: false,
        }
    }

    fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if std::fs::remove_file(&self.path).is_ok() {
            warn!("Removed incomplete file: {}", self.path.display());
        }
    }
}
