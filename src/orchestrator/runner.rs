//! Keyword and batch download loops

use crate::downloader::MediaFetcher;
use crate::extractor::{RecordExtractor, ResolutionPolicy, SearchApi, VideoRecord};
use crate::orchestrator::report::ReportWriter;
use crate::orchestrator::stats::{BatchStats, KeywordStats, VideoSummary};
use crate::orchestrator::status::{scan_status, DownloadStatusReport};
use crate::utils::config::AppSettings;
use crate::utils::error::{Result, ScraperError};
use crate::utils::naming::{cover_filename, ensure_directory, keyword_dir, safe_path, video_filename};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub download_dir: PathBuf,
    pub max_pages: u32,
    pub max_workers: usize,
    pub download_covers: bool,
    pub save_metadata: bool,
    pub request_interval: Duration,
    pub keyword_interval: Duration,
    /// Used when a batch is started without explicit keywords
    pub default_keywords: Vec<String>,
}

impl OrchestratorConfig {
    pub fn from_settings(settings: &AppSettings) -> Self {
        Self {
            download_dir: settings.download.download_dir.clone(),
            max_pages: settings.search.max_pages,
            max_workers: settings.download.max_workers,
            download_covers: settings.download.download_covers,
            save_metadata: settings.download.save_metadata,
            request_interval: settings.api.request_interval(),
            keyword_interval: settings.api.keyword_interval(),
            default_keywords: settings.search.keywords.clone(),
        }
    }
}

enum PageFlow {
    Continue,
    Stop,
}

/// A record together with the variant picked for it
struct DownloadJob {
    record: VideoRecord,
    url: String,
    resolution: String,
}

/// Drives search -> extract -> download for keywords and batches
pub struct Orchestrator {
    search: Arc<dyn SearchApi>,
    fetcher: Arc<dyn MediaFetcher>,
    extractor: RecordExtractor,
    policy: ResolutionPolicy,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        search: Arc<dyn SearchApi>,
        fetcher: Arc<dyn MediaFetcher>,
        extractor: RecordExtractor,
        policy: ResolutionPolicy,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            search,
            fetcher,
            extractor,
            policy,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Runs the page loop for one keyword.
    ///
    /// Only fails before the first page: a blank keyword or a keyword
    /// directory that cannot be created. Page-level errors are logged and
    /// the loop moves on.
    pub async fn download_keyword(&self, keyword: &str, max_pages: Option<u32>) -> Result<KeywordStats> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ScraperError::InvalidKeyword(keyword.to_string()));
        }

        let max_pages = max_pages.unwrap_or(self.config.max_pages);
        let target_dir = ensure_directory(&keyword_dir(&self.config.download_dir, keyword)).await?;

        info!("Downloading keyword '{}', up to {} pages", keyword, max_pages);
        let mut stats = KeywordStats::new(keyword);

        for page in 1..=max_pages {
            match self.process_page(keyword, &target_dir, page, &mut stats).await {
                Ok(PageFlow::Stop) => break,
                Ok(PageFlow::Continue) => {
                    if page < max_pages {
                        sleep(self.config.request_interval).await;
                    }
                }
                Err(e) => {
                    error!("Error processing page {} of '{}': {}", page, keyword, e);
                }
            }
        }

        info!(
            "Keyword '{}' done: {}/{} downloaded",
            keyword, stats.total_downloaded, stats.total_found
        );
        Ok(stats)
    }

    async fn process_page(
        &self,
        keyword: &str,
        target_dir: &Path,
        page: u32,
        stats: &mut KeywordStats,
    ) -> Result<PageFlow> {
        let result = self.search.search(keyword, page).await?;
        if result.is_empty() {
            info!("No more results for '{}' at page {}", keyword, page);
            return Ok(PageFlow::Stop);
        }

        let records = self.extractor.extract_page(&result.items);
        info!(
            "Page {} of '{}': {} items, {} accepted",
            page,
            keyword,
            result.items.len(),
            records.len()
        );
        stats.total_found += records.len();

        let mut jobs = Vec::with_capacity(records.len());
        for record in records {
            match self.policy.select_resolution(&record.download_variants) {
                Some((url, resolution)) => {
                    let (url, resolution) = (url.to_string(), resolution.to_string());
                    jobs.push(DownloadJob {
                        record,
                        url,
                        resolution,
                    });
                }
                None => {
                    warn!("No downloadable variant for '{}'", record.title);
                    stats.record(summarize(&record, false));
                }
            }
        }

        // Barrier: every download of this page finishes before the next search
        let summaries: Vec<VideoSummary> = stream::iter(jobs)
            .map(|job| self.download_video(job, target_dir))
            .buffer_unordered(self.config.max_workers.max(1))
            .collect()
            .await;

        for summary in summaries {
            stats.record(summary);
        }

        Ok(PageFlow::Continue)
    }

    async fn download_video(&self, job: DownloadJob, target_dir: &Path) -> VideoSummary {
        let record = &job.record;
        let filename = video_filename(&record.title, &record.author, &record.id, &job.resolution);

        let video_path = match safe_path(target_dir, &filename) {
            Ok(path) => path,
            Err(e) => {
                error!("Cannot resolve path for '{}': {}", record.title, e);
                return summarize(record, false);
            }
        };

        if let Err(e) = self.fetcher.fetch(&job.url, &video_path).await {
            error!("Video download failed for '{}': {}", record.title, e);
            return summarize(record, false);
        }

        if self.config.download_covers {
            if let Some(cover_url) = record.cover_url.as_deref() {
                self.download_cover(record, cover_url, target_dir).await;
            }
        }

        summarize(record, true)
    }

    /// Cover failures are logged and never affect the video's outcome
    async fn download_cover(&self, record: &VideoRecord, cover_url: &str, target_dir: &Path) {
        let filename = cover_filename(&record.title, &record.author, &record.id);
        let result = match safe_path(target_dir, &filename) {
            Ok(cover_path) => self.fetcher.fetch(cover_url, &cover_path).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!("Cover download failed for '{}': {}", record.title, e);
        }
    }

    /// Runs every keyword in order and writes the batch report.
    ///
    /// An empty `keywords` slice falls back to the configured keywords.
    pub async fn batch_download(&self, keywords: &[String]) -> Result<BatchStats> {
        let keywords = if keywords.is_empty() {
            self.config.default_keywords.clone()
        } else {
            keywords.to_vec()
        };
        if keywords.is_empty() {
            return Err(ScraperError::NoKeywords);
        }

        let total = keywords.len();
        info!("Starting batch of {} keywords", total);
        let mut batch = BatchStats::new(keywords.clone());

        for (index, keyword) in keywords.iter().enumerate() {
            info!("Keyword {}/{}: {}", index + 1, total, keyword);

            match self.download_keyword(keyword, None).await {
                Ok(stats) => batch.record_completed(stats),
                Err(e) => {
                    error!("Keyword '{}' failed: {}", keyword, e);
                    batch.record_failed(keyword, &e);
                }
            }

            if index + 1 < total {
                sleep(self.config.keyword_interval).await;
            }
        }

        batch.finish();

        if self.config.save_metadata {
            if let Err(e) = ReportWriter::new(&self.config.download_dir).save(&batch).await {
                error!("Failed to save download report: {:#}", e);
            }
        }

        info!(
            "Batch done: {}/{} downloaded, {}/{} keywords completed",
            batch.total_downloaded, batch.total_found, batch.completed_keywords, batch.total_keywords
        );
        Ok(batch)
    }

    /// What is currently on disk under the download root
    pub async fn status(&self) -> Result<DownloadStatusReport> {
        Ok(scan_status(&self.config.download_dir).await?)
    }
}

fn summarize(record: &VideoRecord, success: bool) -> VideoSummary {
    VideoSummary {
        title: record.title.clone(),
        author: record.author.clone(),
        duration: record.duration_seconds,
        success,
    }
}
