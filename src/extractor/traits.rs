use crate::extractor::models::SearchPage;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Paginated keyword search
///
/// This trait isolates the orchestrator from the HTTP transport, so the page
/// loop can run against any backend (the real API or a canned one).
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Fetches a 1-based `page` of results for `keyword`.
    ///
    /// An empty page means "no more results"; errors are transport failures
    /// that already exhausted their retries.
    async fn search(&self, keyword: &str, page: u32) -> Result<SearchPage>;
}
