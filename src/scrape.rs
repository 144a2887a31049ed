//! Outward-facing scraper facade.
//!
//! One [`NewsScraper`] holds one [`Fetcher`] and reuses it for every request
//! in a session, mirroring how the web layer drives a scraping run: fetch a
//! listing page, then deep-collect individual records on demand. Rule-aware
//! collection lives on [`crate::rules::RuleEngine`], which borrows the same
//! fetcher.

use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::models::NewsRecord;
use crate::scrapers::{SourceAdapter, SourceKind};
use crate::{deep, listing};
use tracing::{info, instrument};

/// Session-scoped entry point for listing fetches and plain deep collection.
pub struct NewsScraper {
    fetcher: Fetcher,
}

impl NewsScraper {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: Fetcher::new()?,
        })
    }

    /// The session fetcher, for wiring up a
    /// [`RuleEngine`](crate::rules::RuleEngine) or orchestration cycle.
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Fetch one listing page from a tagged source.
    ///
    /// Page numbers below 1 are clamped to 1 before the adapter runs.
    #[instrument(level = "info", skip(self), fields(keyword = %keyword, page))]
    pub fn fetch_news(
        &self,
        kind: SourceKind,
        keyword: &str,
        page: u32,
    ) -> Result<Vec<NewsRecord>, FetchError> {
        self.fetch_news_with(kind.adapter().as_ref(), keyword, page)
    }

    /// Same as [`fetch_news`](Self::fetch_news) with an explicit adapter.
    pub fn fetch_news_with(
        &self,
        adapter: &dyn SourceAdapter,
        keyword: &str,
        page: u32,
    ) -> Result<Vec<NewsRecord>, FetchError> {
        let page = page.max(1);
        let records = adapter.fetch(&self.fetcher, keyword, page)?;
        info!(count = records.len(), site = %adapter.site_name(), "Listing fetched");
        Ok(records)
    }

    /// Fetch one article page and extract its main text with the heuristic
    /// fallback chain. Never fails; see [`deep::deep_collect`].
    pub fn deep_collect(&self, url: &str) -> String {
        deep::deep_collect(&self.fetcher, url)
    }

    /// Parse an already-fetched listing page, useful when the markup comes
    /// from somewhere other than the live site.
    pub fn parse_listing(&self, html: &str) -> Vec<NewsRecord> {
        listing::extract_records(html)
    }
}
