//! Wiring from settings to a ready [`Orchestrator`]

use crate::downloader::{DownloadConfig, DownloadEngine};
use crate::extractor::{RecordExtractor, ResolutionPolicy, SearchClient};
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::utils::config::{parse_cookie_string, AppSettings};
use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const SITE_ORIGIN: &str = "https://www.jianying.com";

/// Command-line values that take precedence over file and environment
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub download_dir: Option<PathBuf>,
    pub cookie: Option<String>,
}

/// File, then environment, then command-line overrides
pub fn load_settings(config_path: &Path, overrides: &SettingsOverrides) -> Result<AppSettings> {
    let mut settings = AppSettings::load(config_path)?;
    settings.apply_env_overrides(|var| std::env::var(var).ok());

    if let Some(dir) = &overrides.download_dir {
        settings.download.download_dir = dir.clone();
    }
    if let Some(cookie) = &overrides.cookie {
        settings.cookies.extend(parse_cookie_string(cookie));
    }
    Ok(settings)
}

/// HTTP client with browser-like default headers and the session cookies
pub fn build_client(settings: &AppSettings) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(header::ORIGIN, HeaderValue::from_static(SITE_ORIGIN));
    headers.insert(
        header::REFERER,
        HeaderValue::from_str(&format!("{}/", SITE_ORIGIN)).context("Invalid referer")?,
    );

    match settings.cookie_header() {
        Some(cookie) => {
            let value = HeaderValue::from_str(&cookie).context("Cookie contains invalid characters")?;
            headers.insert(header::COOKIE, value);
        }
        None => warn!("No cookies configured; search requests may be rejected"),
    }

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
        .context("Failed to build HTTP client")
}

/// Orchestrator backed by the real search API and download engine
pub fn build_orchestrator(settings: &AppSettings) -> Result<Orchestrator> {
    let client = build_client(settings)?;

    let search = SearchClient::from_settings(client.clone(), settings);
    let engine = DownloadEngine::new(
        client,
        DownloadConfig {
            retry_attempts: settings.download.max_retries,
            retry_delay: settings.download.retry_delay(),
            read_timeout: settings.download.download_timeout(),
            ..DownloadConfig::default()
        },
    );

    info!(
        "Downloading into {} with {} workers",
        settings.download.download_dir.display(),
        settings.download.max_workers
    );

    Ok(Orchestrator::new(
        Arc::new(search),
        Arc::new(engine),
        RecordExtractor::from_settings(&settings.search),
        ResolutionPolicy::from_settings(&settings.download),
        OrchestratorConfig::from_settings(settings),
    ))
}
