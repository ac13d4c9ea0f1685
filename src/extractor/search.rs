//! Client for the paginated material search endpoint

use crate::downloader::retry::retry_async;
use crate::extractor::models::{SearchEnvelope, SearchPage, SearchRequest};
use crate::extractor::traits::SearchApi;
use crate::utils::config::AppSettings;
use crate::utils::error::{Result, ScraperError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

/// HTTP implementation of [`SearchApi`]
pub struct SearchClient {
    client: Client,
    search_url: String,
    count_per_page: u32,
    request_timeout: Duration,
    retry_attempts: usize,
    retry_delay: Duration,
}

impl SearchClient {
    pub fn new(client: Client, search_url: impl Into<String>, count_per_page: u32) -> Self {
        Self {
            client,
            search_url: search_url.into(),
            count_per_page: count_per_page.max(1),
            request_timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }

    pub fn from_settings(client: Client, settings: &AppSettings) -> Self {
        Self::new(
            client,
            settings.api.search_url.clone(),
            settings.search.count_per_page,
        )
        .with_timeout(settings.download.request_timeout())
        .with_retry(settings.download.max_retries, settings.download.retry_delay())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, attempts: usize, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    async fn search_attempt(&self, request: &SearchRequest) -> Result<SearchEnvelope> {
        let response = self
            .client
            .post(&self.search_url)
            .json(request)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::HttpStatus(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Turns a decoded envelope into a page; business errors become an empty page
pub fn page_from_envelope(envelope: SearchEnvelope, keyword: &str, page: u32) -> SearchPage {
    if envelope.status_code != Some(0) {
        error!(
            "Search for '{}' page {} rejected (status {:?}): {}",
            keyword,
            page,
            envelope.status_code,
            envelope.status_msg.as_deref().unwrap_or("unknown error")
        );
        return SearchPage::default();
    }

    let page_result = SearchPage::from(envelope);
    info!(
        "Search for '{}' page {} returned {} items",
        keyword,
        page,
        page_result.items.len()
    );
    page_result
}

#[async_trait]
impl SearchApi for SearchClient {
    async fn search(&self, keyword: &str, page: u32) -> Result<SearchPage> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ScraperError::InvalidKeyword(keyword.to_string()));
        }

        let request = SearchRequest::for_page(keyword, page, self.count_per_page);
        debug!("Searching '{}' page {} (cursor {})", keyword, page, request.cursor);

        let label = format!("Search '{}' page {}", keyword, page);
        let envelope = retry_async(&label, self.retry_attempts, self.retry_delay, || {
            self.search_attempt(&request)
        })
        .await?;

        Ok(page_from_envelope(envelope, keyword, page.max(1)))
    }
}
