//! Data structures for search results and video records

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One resolution-specific download entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub url: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Normalized video built from one raw search item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub duration_seconds: u64,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
    /// Resolution label -> variant
    #[serde(default)]
    pub download_variants: BTreeMap<String, Variant>,
    pub cover_url: Option<String>,
}

/// Request body of the search endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub keyword: String,
    pub cursor: u64,
    pub count: u32,
    pub search_id: String,
    pub category: String,
    pub effect_id: String,
    pub panel: String,
    pub resource_type: String,
    pub is_commercial: String,
    pub order: u32,
}

impl SearchRequest {
    /// Payload for a 1-based `page` of `keyword`
    pub fn for_page(keyword: &str, page: u32, count_per_page: u32) -> Self {
        Self {
            keyword: keyword.to_string(),
            cursor: u64::from(page.max(1) - 1) * u64::from(count_per_page),
            count: count_per_page,
            search_id: String::new(),
            category: String::new(),
            effect_id: String::new(),
            panel: "default".to_string(),
            resource_type: "video".to_string(),
            is_commercial: "false".to_string(),
            order: 0,
        }
    }
}

/// Response envelope of the search endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchEnvelope {
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub status_msg: Option<String>,
    #[serde(default)]
    pub data: Option<SearchData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchData {
    /// Absent or `null` once the results are exhausted
    #[serde(default)]
    pub effects: Option<Vec<Value>>,
}

/// Raw items of one result page; empty means there is nothing more to fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub items: Vec<Value>,
}

impl SearchPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<SearchEnvelope> for SearchPage {
    fn from(envelope: SearchEnvelope) -> Self {
        Self {
            items: envelope
                .data
                .and_then(|d| d.effects)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_cursor() {
        assert_eq!(SearchRequest::for_page("sunset", 1, 50).cursor, 0);
        assert_eq!(SearchRequest::for_page("sunset", 3, 50).cursor, 100);
        assert_eq!(SearchRequest::for_page("sunset", 0, 50).cursor, 0);
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(SearchRequest::for_page("sunset", 2, 20)).unwrap();
        assert_eq!(
            body,
            json!({
                "keyword": "sunset",
                "cursor": 20,
                "count": 20,
                "search_id": "",
                "category": "",
                "effect_id": "",
                "panel": "default",
                "resource_type": "video",
                "is_commercial": "false",
                "order": 0
            })
        );
    }

    #[test]
    fn test_envelope_without_data_is_empty_page() {
        let envelope: SearchEnvelope = serde_json::from_str(r#"{"status_code": 0}"#).unwrap();
        assert!(SearchPage::from(envelope).is_empty());
    }

    #[test]
    fn test_null_effects_is_empty_page() {
        let envelope: SearchEnvelope =
            serde_json::from_str(r#"{"status_code": 0, "data": {"effects": null}}"#).unwrap();
        assert!(SearchPage::from(envelope).is_empty());

        let envelope: SearchEnvelope =
            serde_json::from_str(r#"{"status_code": 0, "data": null}"#).unwrap();
        assert!(SearchPage::from(envelope).is_empty());
    }
}
