//! Search-style listing adapter.
//!
//! Issues a fixed query-parameter set against a single search endpoint and
//! feeds the response through the heuristic listing parser. The keyword is
//! mandatory and sent server-side; pagination is expressed as an offset of
//! `(page - 1) * 10` in the `pn` parameter.

use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::listing;
use crate::models::NewsRecord;
use crate::scrapers::SourceAdapter;
use tracing::{info, instrument};

/// Results per listing page at the search endpoint.
const PAGE_SIZE: u32 = 10;

const BAIDU_NEWS_ENDPOINT: &str = "https://www.baidu.com/s";
const BAIDU_SITE_NAME: &str = "百度新闻";

/// Adapter for a keyword-search listing endpoint.
pub struct SearchAdapter {
    site_name: String,
    endpoint: String,
}

impl SearchAdapter {
    pub fn new(site_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            endpoint: endpoint.into(),
        }
    }

    /// The Baidu news search endpoint with its fixed parameter set.
    pub fn baidu_news() -> Self {
        Self::new(BAIDU_SITE_NAME, BAIDU_NEWS_ENDPOINT)
    }

    /// Pagination offset sent as the `pn` parameter.
    fn offset(page: u32) -> u32 {
        page.saturating_sub(1) * PAGE_SIZE
    }
}

impl SourceAdapter for SearchAdapter {
    fn site_name(&self) -> &str {
        &self.site_name
    }

    #[instrument(level = "info", skip_all, fields(keyword = %keyword, page))]
    fn fetch(
        &self,
        fetcher: &Fetcher,
        keyword: &str,
        page: u32,
    ) -> Result<Vec<NewsRecord>, FetchError> {
        info!(site = %self.site_name, "Fetching search listing");

        // rtt=1 sorts by time, cl=2 restricts to news results.
        let params: [(&str, String); 7] = [
            ("rtt", "1".to_string()),
            ("bsst", "1".to_string()),
            ("cl", "2".to_string()),
            ("tn", "news".to_string()),
            ("rsv_dl", "ns_pc".to_string()),
            ("word", keyword.to_string()),
            ("pn", Self::offset(page).to_string()),
        ];

        let html = fetcher.get(&self.endpoint, &params, None)?;
        let records = listing::extract_records(&html);
        info!(count = records.len(), "Search listing parsed");
        Ok(records)
    }
}
