//! Record and rule persistence contracts, with in-memory implementations.
//!
//! The durable store behind the web layer owns transactions and migrations;
//! this crate only depends on the read/write contract below. The in-memory
//! implementations satisfy that contract for the CLI and for tests, holding
//! their state behind a `Mutex` so the rule store's find-and-update is a
//! single serialized operation.

use crate::models::{DeepContent, ExtractionRule, NewsRecord};
use crate::rules::RuleStore;
use chrono::Local;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// A persisted listing record with its deep-collection state.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: i64,
    pub record: NewsRecord,
    pub deep_collected: bool,
}

/// Contract the durable record store must satisfy.
pub trait NewsStore {
    /// Whether a record with this natural key already exists.
    fn exists_by_url(&self, url: &str) -> bool;

    /// Persist a record and return its identifier.
    fn save(&self, record: &NewsRecord) -> i64;

    fn find_by_id(&self, id: i64) -> Option<StoredRecord>;

    /// Flag a record as deep-collected.
    fn mark_deep_collected(&self, id: i64);

    /// Attach the deep-collection text to a record.
    fn save_deep_content(&self, id: i64, content: &str);

    /// Whether a deep-content row exists for a record.
    fn has_deep_content(&self, id: i64) -> bool;
}

#[derive(Default)]
struct NewsState {
    next_id: i64,
    records: Vec<StoredRecord>,
    contents: Vec<DeepContent>,
}

/// In-memory [`NewsStore`].
#[derive(Default)]
pub struct MemoryNewsStore {
    state: Mutex<NewsState>,
}

impl MemoryNewsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-content rows attached to a record, for inspection.
    pub fn deep_contents(&self, id: i64) -> Vec<DeepContent> {
        let state = self.state.lock().unwrap();
        state
            .contents
            .iter()
            .filter(|content| content.record_id == id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NewsStore for MemoryNewsStore {
    fn exists_by_url(&self, url: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.records.iter().any(|stored| stored.record.url == url)
    }

    fn save(&self, record: &NewsRecord) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.records.push(StoredRecord {
            id,
            record: record.clone(),
            deep_collected: false,
        });
        debug!(id, url = %record.url, "Saved record");
        id
    }

    fn find_by_id(&self, id: i64) -> Option<StoredRecord> {
        let state = self.state.lock().unwrap();
        state.records.iter().find(|stored| stored.id == id).cloned()
    }

    fn mark_deep_collected(&self, id: i64) {
        let mut state = self.state.lock().unwrap();
        if let Some(stored) = state.records.iter_mut().find(|stored| stored.id == id) {
            stored.deep_collected = true;
        }
    }

    fn save_deep_content(&self, id: i64, content: &str) {
        let mut state = self.state.lock().unwrap();
        state.contents.push(DeepContent {
            record_id: id,
            content: content.to_string(),
            created_at: Local::now(),
        });
    }

    fn has_deep_content(&self, id: i64) -> bool {
        let state = self.state.lock().unwrap();
        state.contents.iter().any(|content| content.record_id == id)
    }
}

/// In-memory [`RuleStore`]; `site_url` is unique across rules.
#[derive(Default)]
pub struct MemoryRuleStore {
    rules: Mutex<Vec<ExtractionRule>>,
}

impl MemoryRuleStore {
    pub fn new(rules: Vec<ExtractionRule>) -> Self {
        Self {
            rules: Mutex::new(rules),
        }
    }

    /// Add a rule; rejects a duplicate `site_url`.
    pub fn insert(&self, rule: ExtractionRule) -> bool {
        let mut rules = self.rules.lock().unwrap();
        if rules.iter().any(|existing| existing.site_url == rule.site_url) {
            return false;
        }
        rules.push(rule);
        true
    }
}

fn matches_source(rule: &ExtractionRule, source: &str) -> bool {
    rule.site_name
        .to_lowercase()
        .contains(&source.to_lowercase())
}

impl RuleStore for MemoryRuleStore {
    fn find_rule(&self, source: &str) -> Option<ExtractionRule> {
        let rules = self.rules.lock().unwrap();
        rules.iter().find(|rule| matches_source(rule, source)).cloned()
    }

    fn update_rule(
        &self,
        source: &str,
        title_selector: Option<&str>,
        content_selector: Option<&str>,
    ) -> bool {
        // Find-and-update under one lock: no lost updates between two
        // concurrent auto-discoveries.
        let mut rules = self.rules.lock().unwrap();
        let Some(rule) = rules.iter_mut().find(|rule| matches_source(rule, source)) else {
            return false;
        };
        if let Some(title_selector) = title_selector {
            rule.title_selector = title_selector.to_string();
        }
        if let Some(content_selector) = content_selector {
            rule.content_selector = content_selector.to_string();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str) -> NewsRecord {
        NewsRecord {
            image_url: String::new(),
            title: "标题".to_string(),
            source: "新华网".to_string(),
            url: url.to_string(),
        }
    }

    fn rule(site_name: &str, site_url: &str) -> ExtractionRule {
        ExtractionRule {
            site_name: site_name.to_string(),
            site_url: site_url.to_string(),
            title_selector: "h1".to_string(),
            content_selector: "div.content".to_string(),
            request_headers: None,
        }
    }

    #[test]
    fn test_exists_by_url_after_save() {
        let store = MemoryNewsStore::new();
        assert!(!store.exists_by_url("https://example.com/a"));
        store.save(&record("https://example.com/a"));
        assert!(store.exists_by_url("https://example.com/a"));
    }

    #[test]
    fn test_deep_content_lifecycle() {
        let store = MemoryNewsStore::new();
        let id = store.save(&record("https://example.com/a"));
        assert!(!store.has_deep_content(id));

        store.save_deep_content(id, "全文内容");
        store.mark_deep_collected(id);

        assert!(store.has_deep_content(id));
        assert!(store.find_by_id(id).unwrap().deep_collected);
        assert_eq!(store.deep_contents(id)[0].content, "全文内容");
    }

    #[test]
    fn test_find_rule_case_insensitive_substring() {
        let store = MemoryRuleStore::new(vec![rule("Sichuan Daily 川观新闻", "https://scdaily.example")]);
        assert!(store.find_rule("sichuan").is_some());
        assert!(store.find_rule("川观").is_some());
        assert!(store.find_rule("红星").is_none());
    }

    #[test]
    fn test_update_rule_touches_only_given_fields() {
        let store = MemoryRuleStore::new(vec![rule("川观新闻", "https://scdaily.example")]);
        assert!(store.update_rule("川观", None, Some("article")));
        let updated = store.find_rule("川观").unwrap();
        assert_eq!(updated.title_selector, "h1");
        assert_eq!(updated.content_selector, "article");
    }

    #[test]
    fn test_update_rule_unmatched_is_noop() {
        let store = MemoryRuleStore::new(vec![rule("川观新闻", "https://scdaily.example")]);
        assert!(!store.update_rule("封面新闻", Some("h2"), None));
        assert_eq!(store.find_rule("川观").unwrap().title_selector, "h1");
    }

    #[test]
    fn test_insert_rejects_duplicate_site_url() {
        let store = MemoryRuleStore::default();
        assert!(store.insert(rule("川观新闻", "https://scdaily.example")));
        assert!(!store.insert(rule("川观新闻改版", "https://scdaily.example")));
    }
}
