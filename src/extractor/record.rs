//! Raw search item -> [`VideoRecord`], duration filtering and resolution choice

use crate::extractor::models::{Variant, VideoRecord};
use crate::utils::config::{DownloadSettings, SearchSettings};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Author used when the item carries none
pub const UNKNOWN_AUTHOR: &str = "unknown author";

/// Inclusive duration bounds, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationFilter {
    pub min_seconds: u64,
    pub max_seconds: u64,
}

impl DurationFilter {
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            min_seconds,
            max_seconds,
        }
    }

    pub fn accepts(&self, seconds: f64) -> bool {
        seconds >= self.min_seconds as f64 && seconds <= self.max_seconds as f64
    }
}

/// Builds [`VideoRecord`]s from raw API items
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    filter: DurationFilter,
}

impl RecordExtractor {
    pub fn new(filter: DurationFilter) -> Self {
        Self { filter }
    }

    pub fn from_settings(search: &SearchSettings) -> Self {
        Self::new(DurationFilter::new(search.min_duration, search.max_duration))
    }

    /// Record for `raw`, or `None` when the item is malformed or filtered out
    pub fn extract(&self, raw: &Value) -> Option<VideoRecord> {
        let Some(item) = raw.as_object() else {
            warn!("Skipping search item that is not an object: {}", raw);
            return None;
        };

        let duration = number_field(item.get("duration"));
        if !self.filter.accepts(duration) {
            debug!(
                "Duration {}s outside [{}, {}], skipping",
                duration, self.filter.min_seconds, self.filter.max_seconds
            );
            return None;
        }

        let author = nested_str(item, &["author", "nickname"])
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(UNKNOWN_AUTHOR)
            .to_string();

        let tags = item
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .map(|t| t.get("tag_name").and_then(Value::as_str).unwrap_or_default())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let cover_url = item
            .get("cover")
            .and_then(|c| c.get("url_list"))
            .and_then(first_url);

        Some(VideoRecord {
            id: id_field(item.get("id")),
            title: item
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string(),
            author,
            duration_seconds: duration.round() as u64,
            create_time: number_field(item.get("create_time")) as i64,
            tags,
            category: nested_str(item, &["category", "title"])
                .unwrap_or_default()
                .to_string(),
            download_variants: variants(item.get("videos")),
            cover_url,
        })
    }

    /// Every acceptable record on a page, in page order
    pub fn extract_page(&self, items: &[Value]) -> Vec<VideoRecord> {
        items.iter().filter_map(|raw| self.extract(raw)).collect()
    }
}

/// Preferred label, then the priority list, then whatever is available
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionPolicy {
    pub preferred: String,
    pub priority: Vec<String>,
}

impl ResolutionPolicy {
    pub fn new(preferred: impl Into<String>, priority: Vec<String>) -> Self {
        Self {
            preferred: preferred.into(),
            priority,
        }
    }

    pub fn from_settings(download: &DownloadSettings) -> Self {
        Self::new(
            download.preferred_resolution.clone(),
            download.resolution_priority.clone(),
        )
    }

    /// `(url, label)` of the chosen variant
    pub fn select_resolution<'a>(&self, variants: &'a BTreeMap<String, Variant>) -> Option<(&'a str, &'a str)> {
        std::iter::once(&self.preferred)
            .chain(self.priority.iter())
            .find_map(|label| variants.get_key_value(label.as_str()))
            .or_else(|| variants.iter().next())
            .map(|(label, variant)| (variant.url.as_str(), label.as_str()))
    }
}

fn variants(videos: Option<&Value>) -> BTreeMap<String, Variant> {
    let Some(videos) = videos.and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    videos
        .iter()
        .filter_map(|(quality, data)| {
            let url = first_url(data.get("url_list")?)?;
            Some((
                quality.clone(),
                Variant {
                    url,
                    size_bytes: number_field(data.get("size")) as u64,
                    width: number_field(data.get("width")) as u32,
                    height: number_field(data.get("height")) as u32,
                },
            ))
        })
        .collect()
}

fn first_url(list: &Value) -> Option<String> {
    list.as_array()?
        .first()?
        .as_str()
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

fn nested_str<'a>(item: &'a Map<String, Value>, path: &[&str]) -> Option<&'a str> {
    let (first, rest) = path.split_first()?;
    let mut current = item.get(*first)?;
    for key in rest {
        current = current.get(*key)?;
    }
    current.as_str()
}

/// Numbers may arrive as integers, floats or numeric strings; anything else is 0
fn number_field(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}

fn id_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
