//! Ingestion cycles and batch deep collection.
//!
//! A listing cycle is idempotent: records already persisted (by natural key
//! `url`) are skipped, so running the same fetch twice against an unchanged
//! page persists nothing new the second time. Batch deep collection reports
//! a per-record outcome instead of a single pass/fail, because one
//! unreachable article must not abort the rest of the batch.

use crate::deep::COLLECT_FAILURE_PREFIX;
use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::models::NewsRecord;
use crate::rules::RuleEngine;
use crate::scrapers::SourceAdapter;
use crate::store::NewsStore;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Result of one listing fetch cycle.
#[derive(Debug)]
pub struct ListingOutcome {
    /// How many records were newly persisted this cycle.
    pub new_count: usize,
    /// Every valid record considered, existing and new alike, in listing
    /// order.
    pub records: Vec<NewsRecord>,
}

/// Per-record outcome of a batch deep collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectStatus {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Serialize)]
pub struct CollectReport {
    pub id: i64,
    pub status: CollectStatus,
    pub message: String,
}

/// Run one listing fetch cycle: fetch, validate, dedup, persist.
#[instrument(level = "info", skip_all, fields(keyword = %keyword, page))]
pub fn run_listing_cycle(
    adapter: &dyn SourceAdapter,
    fetcher: &Fetcher,
    store: &dyn NewsStore,
    keyword: &str,
    page: u32,
) -> Result<ListingOutcome, FetchError> {
    let fetched = adapter.fetch(fetcher, keyword, page)?;

    let mut new_count = 0;
    let mut records = Vec::with_capacity(fetched.len());
    for record in fetched {
        if !record.is_valid() {
            warn!(url = %record.url, "Discarding invalid record");
            continue;
        }
        if store.exists_by_url(&record.url) {
            info!(url = %record.url, "Record already persisted; skipping");
        } else {
            store.save(&record);
            new_count += 1;
        }
        records.push(record);
    }

    info!(
        site = %adapter.site_name(),
        total = records.len(),
        new = new_count,
        "Listing cycle finished"
    );
    Ok(ListingOutcome { new_count, records })
}

/// Deep-collect a batch of persisted records by id.
///
/// Records already flagged deep-collected are skipped with a warning even
/// when no content row is attached; a collection that comes back with the
/// failure marker is reported as an error and leaves the record untouched
/// for a later retry.
#[instrument(level = "info", skip_all, fields(batch = ids.len(), update_rule))]
pub fn deep_collect_batch(
    engine: &RuleEngine<'_>,
    store: &dyn NewsStore,
    ids: &[i64],
    update_rule: bool,
) -> Vec<CollectReport> {
    let mut reports = Vec::with_capacity(ids.len());
    for &id in ids {
        reports.push(collect_one(engine, store, id, update_rule));
    }

    let succeeded = reports
        .iter()
        .filter(|report| report.status == CollectStatus::Success)
        .count();
    info!(total = reports.len(), succeeded, "Batch deep collection finished");
    reports
}

fn collect_one(
    engine: &RuleEngine<'_>,
    store: &dyn NewsStore,
    id: i64,
    update_rule: bool,
) -> CollectReport {
    let Some(stored) = store.find_by_id(id) else {
        return CollectReport {
            id,
            status: CollectStatus::Error,
            message: "record not found".to_string(),
        };
    };

    if stored.deep_collected {
        // Flag may be set with no content row attached; still skipped.
        if !store.has_deep_content(id) {
            warn!(id, "Record flagged deep-collected but has no content row");
        }
        return CollectReport {
            id,
            status: CollectStatus::Warning,
            message: "already deep-collected; skipped".to_string(),
        };
    }

    let content = engine.collect_by_source(&stored.record.url, &stored.record.source, update_rule);
    if content.starts_with(COLLECT_FAILURE_PREFIX) {
        return CollectReport {
            id,
            status: CollectStatus::Error,
            message: content,
        };
    }

    store.save_deep_content(id, &content);
    store.mark_deep_collected(id);
    CollectReport {
        id,
        status: CollectStatus::Success,
        message: format!("collected {} chars", content.chars().count()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewsRecord;
    use crate::store::MemoryNewsStore;

    /// Adapter returning a canned listing, standing in for a live page.
    struct FixtureAdapter {
        records: Vec<NewsRecord>,
    }

    impl SourceAdapter for FixtureAdapter {
        fn site_name(&self) -> &str {
            "fixture"
        }

        fn fetch(
            &self,
            _fetcher: &Fetcher,
            _keyword: &str,
            _page: u32,
        ) -> Result<Vec<NewsRecord>, FetchError> {
            Ok(self.records.clone())
        }
    }

    fn record(title: &str, url: &str) -> NewsRecord {
        NewsRecord {
            image_url: String::new(),
            title: title.to_string(),
            source: "新华网".to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_second_cycle_persists_nothing_new() {
        let adapter = FixtureAdapter {
            records: vec![
                record("成都新闻一", "https://example.com/1"),
                record("成都新闻二", "https://example.com/2"),
            ],
        };
        let fetcher = Fetcher::new().unwrap();
        let store = MemoryNewsStore::new();

        let first = run_listing_cycle(&adapter, &fetcher, &store, "成都", 1).unwrap();
        assert_eq!(first.new_count, 2);
        assert_eq!(first.records.len(), 2);

        let second = run_listing_cycle(&adapter, &fetcher, &store, "成都", 1).unwrap();
        assert_eq!(second.new_count, 0);
        // The full considered set still comes back.
        assert_eq!(second.records.len(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_invalid_records_never_reach_the_store() {
        let adapter = FixtureAdapter {
            records: vec![
                record("有效记录", "https://example.com/ok"),
                record("", "https://example.com/no-title"),
                record("没有链接", ""),
            ],
        };
        let fetcher = Fetcher::new().unwrap();
        let store = MemoryNewsStore::new();

        let outcome = run_listing_cycle(&adapter, &fetcher, &store, "", 1).unwrap();
        assert_eq!(outcome.new_count, 1);
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.records.iter().all(NewsRecord::is_valid));
    }

    #[test]
    fn test_batch_skips_already_collected_with_warning() {
        let fetcher = Fetcher::new().unwrap();
        let rules = crate::store::MemoryRuleStore::default();
        let engine = RuleEngine::new(&fetcher, &rules);
        let store = MemoryNewsStore::new();

        let id = store.save(&record("已采集", "https://example.com/done"));
        store.mark_deep_collected(id);

        let reports = deep_collect_batch(&engine, &store, &[id], false);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].status, CollectStatus::Warning);
        // No content row was created by the skip.
        assert!(!store.has_deep_content(id));
    }

    #[test]
    fn test_batch_failed_default_collection_is_error_without_persisting() {
        let fetcher = Fetcher::new().unwrap();
        let rules = crate::store::MemoryRuleStore::default();
        let engine = RuleEngine::new(&fetcher, &rules);
        let store = MemoryNewsStore::new();

        // No rule matches the source and port 1 refuses the connection.
        let id = store.save(&record("采集失败的记录", "http://127.0.0.1:1/article"));
        let reports = deep_collect_batch(&engine, &store, &[id], false);

        assert_eq!(reports[0].status, CollectStatus::Error);
        assert!(reports[0].message.starts_with(COLLECT_FAILURE_PREFIX));
        // Nothing persisted, flag untouched, so the record can be retried.
        assert!(!store.has_deep_content(id));
        assert!(!store.find_by_id(id).unwrap().deep_collected);
    }

    #[test]
    fn test_batch_failed_rule_collection_is_error_without_persisting() {
        let fetcher = Fetcher::new().unwrap();
        let rules = crate::store::MemoryRuleStore::new(vec![crate::models::ExtractionRule {
            site_name: "新华网".to_string(),
            site_url: "https://www.news.cn".to_string(),
            title_selector: "h1".to_string(),
            content_selector: "div.content".to_string(),
            request_headers: None,
        }]);
        let engine = RuleEngine::new(&fetcher, &rules);
        let store = MemoryNewsStore::new();

        let id = store.save(&record("规则命中但抓取失败", "http://127.0.0.1:1/article"));
        let reports = deep_collect_batch(&engine, &store, &[id], false);

        assert_eq!(reports[0].status, CollectStatus::Error);
        assert!(!store.has_deep_content(id));
        assert!(!store.find_by_id(id).unwrap().deep_collected);
    }

    #[test]
    fn test_batch_reports_missing_record_as_error() {
        let fetcher = Fetcher::new().unwrap();
        let rules = crate::store::MemoryRuleStore::default();
        let engine = RuleEngine::new(&fetcher, &rules);
        let store = MemoryNewsStore::new();

        let reports = deep_collect_batch(&engine, &store, &[42], false);
        assert_eq!(reports[0].status, CollectStatus::Error);
    }
}
