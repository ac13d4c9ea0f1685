//! Application configuration
//!
//! Settings are layered: built-in defaults, then a JSON file
//! (`config/settings.json` unless told otherwise), then a fixed set of
//! environment variables applied by [`AppSettings::apply_env_overrides`].

use crate::utils::error::ScraperError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.json";

/// Cookies the search API expects on every request
pub const REQUIRED_COOKIES: [&str; 3] = ["sessionid", "sid_tt", "sid_guard"];

/// Resolution labels the API is known to serve
pub const VALID_RESOLUTIONS: [&str; 5] = ["1080p", "720p", "480p", "360p", "origin"];

const ENV_OVERRIDES: [(&str, &str); 5] = [
    ("CLIPHARVEST_DOWNLOAD_DIR", "download.download_dir"),
    ("CLIPHARVEST_MAX_WORKERS", "download.max_workers"),
    ("CLIPHARVEST_RESOLUTION", "download.preferred_resolution"),
    ("CLIPHARVEST_MAX_PAGES", "search.max_pages"),
    ("CLIPHARVEST_LOG_LEVEL", "logging.level"),
];

const ENV_COOKIE: &str = "CLIPHARVEST_COOKIE";

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    /// Session cookies sent with every request
    pub cookies: BTreeMap<String, String>,
    pub search: SearchSettings,
    pub download: DownloadSettings,
    pub api: ApiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub keywords: Vec<String>,
    pub max_pages: u32,
    pub count_per_page: u32,
    /// Shortest accepted video, in seconds (inclusive)
    pub min_duration: u64,
    /// Longest accepted video, in seconds (inclusive)
    pub max_duration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    pub download_dir: PathBuf,
    pub preferred_resolution: String,
    pub resolution_priority: Vec<String>,
    pub max_workers: usize,
    pub max_retries: usize,
    /// Seconds between retry attempts
    pub retry_delay: f64,
    /// Seconds allowed for a search request
    pub request_timeout: u64,
    /// Seconds a file transfer may go without receiving data
    pub download_timeout: u64,
    pub download_covers: bool,
    pub save_metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub search_url: String,
    /// Seconds to pause between pages
    pub request_interval: f64,
    /// Seconds to pause between keywords
    pub keyword_interval: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_dir: PathBuf,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            keywords: vec!["natural scenery".to_string(), "city night view".to_string()],
            max_pages: 5,
            count_per_page: 50,
            min_duration: 3,
            max_duration: 300,
        }
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            preferred_resolution: "720p".to_string(),
            resolution_priority: ["1080p", "720p", "480p", "360p"]
                .iter()
                .map(|r| r.to_string())
                .collect(),
            max_workers: 3,
            max_retries: 3,
            retry_delay: 2.0,
            request_timeout: 30,
            download_timeout: 300,
            download_covers: true,
            save_metadata: true,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            search_url: "https://lv-web-lf.capcut.com/ies/resource/web/v1/effect/search"
                .to_string(),
            request_interval: 1.0,
            keyword_interval: 2.0,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file_enabled: true,
            console_enabled: true,
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl DownloadSettings {
    pub fn retry_delay(&self) -> Duration {
        secs(self.retry_delay)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout)
    }
}

impl ApiSettings {
    pub fn request_interval(&self) -> Duration {
        secs(self.request_interval)
    }

    pub fn keyword_interval(&self) -> Duration {
        secs(self.keyword_interval)
    }
}

fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

impl AppSettings {
    /// Defaults overlaid with the JSON file at `path`.
    ///
    /// A missing file yields defaults; a file that does not parse is logged
    /// and ignored.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Reading {}", path.display()))?;

        match serde_json::from_str::<AppSettings>(&content) {
            Ok(settings) => {
                info!("Loaded configuration file: {}", path.display());
                Ok(settings)
            }
            Err(e) => {
                warn!("Ignoring configuration file {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Writes the settings as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json).with_context(|| format!("Writing {}", path.display()))?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Applies the environment overlay through `lookup`, returning the
    /// variables that took effect.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut applied = Vec::new();

        for (var, path) in ENV_OVERRIDES {
            let Some(raw) = lookup(var).map(|v| v.trim().to_string()) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }
            match self.set(path, coerce_env_value(&raw)) {
                Ok(()) => {
                    info!("Environment override: {} = {}", var, raw);
                    applied.push(var.to_string());
                }
                Err(e) => warn!("Ignoring {}: {}", var, e),
            }
        }

        if let Some(raw) = lookup(ENV_COOKIE) {
            let parsed = parse_cookie_string(&raw);
            if !parsed.is_empty() {
                self.cookies.extend(parsed);
                applied.push(ENV_COOKIE.to_string());
            }
        }

        applied
    }

    /// Value at a dotted key path such as `download.max_workers`
    pub fn get(&self, path: &str) -> Option<Value> {
        let view = serde_json::to_value(self).ok()?;
        view.pointer(&json_pointer(path)).cloned()
    }

    /// Replaces the value at a dotted key path.
    ///
    /// Only existing keys can be set, except under `cookies`; the value must
    /// fit the typed field.
    pub fn set(&mut self, path: &str, value: Value) -> std::result::Result<(), ScraperError> {
        let invalid = |reason: String| ScraperError::InvalidConfigValue {
            key: path.to_string(),
            reason,
        };

        let mut view = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let pointer = json_pointer(path);
        let (parent, key) = pointer
            .rsplit_once('/')
            .ok_or_else(|| ScraperError::UnknownConfigKey(path.to_string()))?;

        let object = view
            .pointer_mut(parent)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ScraperError::UnknownConfigKey(path.to_string()))?;

        if key.is_empty() || (!object.contains_key(key) && parent != "/cookies") {
            return Err(ScraperError::UnknownConfigKey(path.to_string()));
        }
        object.insert(key.to_string(), value);

        *self = serde_json::from_value(view).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Human-readable problems; an empty list means the settings are usable
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let missing = self.missing_cookies();
        if !missing.is_empty() {
            errors.push(format!("Missing cookies: {}", missing.join(", ")));
        }

        if self.download.download_dir.as_os_str().is_empty() {
            errors.push("Download directory is not configured".to_string());
        }

        if self.search.keywords.iter().all(|k| k.trim().is_empty()) {
            errors.push("No search keywords configured".to_string());
        }

        let resolution = &self.download.preferred_resolution;
        if !VALID_RESOLUTIONS.contains(&resolution.as_str()) {
            errors.push(format!("Invalid resolution: {}", resolution));
        }

        if !(1..=10).contains(&self.download.max_workers) {
            errors.push("max_workers must be between 1 and 10".to_string());
        }

        if self.search.min_duration > self.search.max_duration {
            errors.push(format!(
                "min_duration ({}) is greater than max_duration ({})",
                self.search.min_duration, self.search.max_duration
            ));
        }

        if self.search.max_pages == 0 {
            errors.push("max_pages must be at least 1".to_string());
        }

        if self.search.count_per_page == 0 {
            errors.push("count_per_page must be at least 1".to_string());
        }

        errors
    }

    pub fn missing_cookies(&self) -> Vec<&'static str> {
        REQUIRED_COOKIES
            .iter()
            .copied()
            .filter(|name| self.cookies.get(*name).map_or(true, |v| v.is_empty()))
            .collect()
    }

    pub fn is_cookies_configured(&self) -> bool {
        self.missing_cookies().is_empty()
    }

    /// Cookies rendered as a single `Cookie` header value
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Parses a browser cookie header (`a=1; b=2`) into name/value pairs
pub fn parse_cookie_string(cookie_string: &str) -> BTreeMap<String, String> {
    cookie_string
        .split(';')
        .filter_map(|item| {
            let (key, value) = item.trim().split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                None
            } else {
                Some((key.to_string(), value.trim().to_string()))
            }
        })
        .collect()
}

fn json_pointer(path: &str) -> String {
    format!("/{}", path.trim_matches('.').replace('.', "/"))
}

fn coerce_env_value(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<u64>() {
        return Value::from(n);
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn with_cookies() -> AppSettings {
        let mut settings = AppSettings::default();
        for name in REQUIRED_COOKIES {
            settings.cookies.insert(name.to_string(), "x".to_string());
        }
        settings
    }

    #[test]
    fn test_default_config() {
        let config = AppSettings::default();
        assert_eq!(config.download.max_workers, 3);
        assert_eq!(config.download.max_retries, 3);
        assert_eq!(config.search.count_per_page, 50);
        assert_eq!(config.download.preferred_resolution, "720p");
        assert_eq!(config.api.request_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_defaults_validate_except_cookies() {
        let errors = AppSettings::default().validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Missing cookies"));

        assert!(with_cookies().validate().is_empty());
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let mut settings = with_cookies();
        settings.download.max_workers = 11;
        settings.download.preferred_resolution = "4k".to_string();
        settings.search.keywords.clear();
        settings.search.min_duration = 100;
        settings.search.max_duration = 10;

        let errors = settings.validate();
        assert_eq!(errors.len(), 4, "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("max_workers")));
        assert!(errors.iter().any(|e| e.contains("4k")));
    }

    #[test]
    fn test_partial_file_overlays_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(
            &path,
            r#"{"download": {"max_workers": 6}, "cookies": {"sessionid": "abc"}}"#,
        )
        .unwrap();

        let settings = AppSettings::load(&path).unwrap();
        assert_eq!(settings.download.max_workers, 6);
        assert_eq!(settings.download.max_retries, 3);
        assert_eq!(settings.cookies.get("sessionid").map(String::as_str), Some("abc"));
        assert_eq!(settings.search, SearchSettings::default());
    }

    #[test]
    fn test_load_missing_or_broken_file_yields_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let missing = AppSettings::load(&temp.path().join("nope.json")).unwrap();
        assert_eq!(missing, AppSettings::default());

        let broken = temp.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(AppSettings::load(&broken).unwrap(), AppSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config/settings.json");
        let mut settings = with_cookies();
        settings.search.keywords = vec!["sunset".to_string()];
        settings.save(&path).unwrap();

        assert_eq!(AppSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_get_and_set_paths() {
        let mut settings = AppSettings::default();
        assert_eq!(settings.get("download.max_workers"), Some(json!(3)));
        assert_eq!(settings.get("nope.value"), None);

        settings.set("download.max_workers", json!(8)).unwrap();
        assert_eq!(settings.download.max_workers, 8);

        settings.set("cookies.sid_tt", json!("tok")).unwrap();
        assert_eq!(settings.cookies.get("sid_tt").map(String::as_str), Some("tok"));

        assert!(matches!(
            settings.set("download.unknown", json!(1)),
            Err(ScraperError::UnknownConfigKey(_))
        ));
        assert!(matches!(
            settings.set("download.max_workers", json!("many")),
            Err(ScraperError::InvalidConfigValue { .. })
        ));
        // A rejected value leaves the settings untouched
        assert_eq!(settings.download.max_workers, 8);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CLIPHARVEST_MAX_WORKERS", "5"),
            ("CLIPHARVEST_RESOLUTION", "1080p"),
            ("CLIPHARVEST_DOWNLOAD_DIR", "/data/clips"),
            ("CLIPHARVEST_MAX_PAGES", "not-a-number"),
            ("CLIPHARVEST_COOKIE", "sessionid=s1; sid_tt=t1"),
        ]
        .into_iter()
        .collect();

        let mut settings = AppSettings::default();
        let applied = settings.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.download.max_workers, 5);
        assert_eq!(settings.download.preferred_resolution, "1080p");
        assert_eq!(settings.download.download_dir, PathBuf::from("/data/clips"));
        assert_eq!(settings.search.max_pages, 5);
        assert_eq!(settings.cookies.get("sid_tt").map(String::as_str), Some("t1"));
        assert!(!applied.contains(&"CLIPHARVEST_MAX_PAGES".to_string()));
    }

    #[test]
    fn test_parse_cookie_string() {
        let cookies = parse_cookie_string(" sessionid=abc ; sid_guard=a=b; junk; =x");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["sessionid"], "abc");
        assert_eq!(cookies["sid_guard"], "a=b");
    }

    #[test]
    fn test_cookie_header() {
        assert_eq!(AppSettings::default().cookie_header(), None);
        let header = with_cookies().cookie_header().unwrap();
        assert_eq!(header, "sessionid=x; sid_guard=x; sid_tt=x");
    }
}
