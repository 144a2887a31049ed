//! Data models for listing records, extraction rules, and deep content.
//!
//! [`NewsRecord`] is the unit produced by a listing fetch. Its serde field
//! order is part of the wire contract: downstream consumers rely on JSON
//! keys appearing exactly as `image_url, title, source, url`, so the struct
//! declaration order must not change.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One discovered listing entry.
///
/// A record with an empty `title` or empty `url` is invalid and is discarded
/// before it ever reaches persistence. `url` is the natural key used for
/// deduplication across repeated ingestion runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewsRecord {
    /// Cover image URL, empty string when the entry carries no image.
    pub image_url: String,
    /// Headline text taken from the entry's first anchor.
    pub title: String,
    /// Source label (publisher name); may be empty when the listing page
    /// only exposed a timestamp.
    pub source: String,
    /// Absolute URL of the article detail page.
    pub url: String,
}

impl NewsRecord {
    /// A record is persistable only when both mandatory fields are present.
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty() && !self.url.is_empty()
    }
}

/// A persisted per-source recipe for deep extraction.
///
/// `site_name` is matched by case-insensitive substring against a record's
/// `source`; `site_url` is unique across rules. Selectors may be written in
/// either the attribute-path dialect (leading `//`) or native CSS; the rule
/// engine detects and translates before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub site_name: String,
    pub site_url: String,
    pub title_selector: String,
    pub content_selector: String,
    /// Extra request headers merged over the fetcher's browser defaults
    /// when collecting from this site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<HashMap<String, String>>,
}

/// The full-text result of one deep collection.
///
/// At most one `DeepContent` exists per record; the orchestration layer
/// enforces this, not the extraction engine.
#[derive(Debug, Clone)]
pub struct DeepContent {
    /// Identifier of the owning [`NewsRecord`] row.
    pub record_id: i64,
    /// Extracted text, newline-joined paragraphs.
    pub content: String,
    pub created_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_validity() {
        let good = NewsRecord {
            image_url: String::new(),
            title: "西昌新闻".to_string(),
            source: String::new(),
            url: "https://example.com/a".to_string(),
        };
        assert!(good.is_valid());

        let no_title = NewsRecord {
            title: String::new(),
            ..good.clone()
        };
        assert!(!no_title.is_valid());

        let no_url = NewsRecord {
            url: String::new(),
            ..good
        };
        assert!(!no_url.is_valid());
    }

    #[test]
    fn test_record_json_field_order() {
        let record = NewsRecord {
            image_url: "https://img.example.com/p.png".to_string(),
            title: "标题".to_string(),
            source: "新华网".to_string(),
            url: "https://example.com/a".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let image_pos = json.find("image_url").unwrap();
        let title_pos = json.find("\"title\"").unwrap();
        let source_pos = json.find("\"source\"").unwrap();
        let url_pos = json.rfind("\"url\"").unwrap();
        assert!(image_pos < title_pos);
        assert!(title_pos < source_pos);
        assert!(source_pos < url_pos);
    }

    #[test]
    fn test_rule_round_trip_without_headers() {
        let rule = ExtractionRule {
            site_name: "新华网".to_string(),
            site_url: "https://www.news.cn".to_string(),
            title_selector: "h1.title".to_string(),
            content_selector: "div.article-content".to_string(),
            request_headers: None,
        };
        let json = serde_json::to_string(&rule).unwrap();
        assert!(!json.contains("request_headers"));
        let back: ExtractionRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }
}
