//! Static-page listing adapter.
//!
//! Some sources expose a plain index page instead of a search endpoint. The
//! adapter always requests the same fixed URL; the keyword, when given, is
//! applied afterwards as a case-sensitive substring filter over titles, and
//! pagination beyond the first page is unsupported.
//!
//! Index pages link articles with a mix of relative forms, so every
//! discovered link and image is normalized through the ordered rules in
//! [`normalize_url`]. The same entry sometimes appears in two markup shapes
//! (a plain list item and a term/definition pair); duplicates are removed by
//! full record equality before the result is returned.

use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::listing::element_text;
use crate::models::NewsRecord;
use crate::scrapers::SourceAdapter;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{info, instrument, warn};
use url::Url;

const CHENGDU_GOV_SITE_NAME: &str = "成都市人民政府";
const CHENGDU_GOV_LISTING_URL: &str = "https://www.chengdu.gov.cn/cdsrmzf/c147924/common_list.shtml";

static LIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("ul li, dl dt, dl dd").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Whether a link opens with an RFC 3986 scheme (`alpha (alnum|+|-|.)* :`).
fn has_scheme(link: &str) -> bool {
    let Some(colon) = link.find(':') else {
        return false;
    };
    let head = &link[..colon];
    let mut chars = head.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Adapter for one fixed index page.
pub struct StaticListingAdapter {
    site_name: String,
    listing_url: String,
    /// Scheme + host of the listing URL, no trailing slash.
    origin: String,
    /// Listing URL up to and including its last path slash.
    base_path: String,
}

impl StaticListingAdapter {
    /// Build an adapter for the given index page URL.
    ///
    /// Falls back to the URL string itself for origin/base when the URL does
    /// not parse; normalization then degrades but never panics.
    pub fn new(site_name: impl Into<String>, listing_url: impl Into<String>) -> Self {
        let listing_url = listing_url.into();
        let origin = Url::parse(&listing_url)
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_else(|_| listing_url.clone());
        let base_path = match listing_url.rfind('/') {
            Some(pos) => listing_url[..=pos].to_string(),
            None => listing_url.clone(),
        };
        Self {
            site_name: site_name.into(),
            listing_url,
            origin,
            base_path,
        }
    }

    /// The Chengdu municipal government news index.
    pub fn chengdu_gov() -> Self {
        Self::new(CHENGDU_GOV_SITE_NAME, CHENGDU_GOV_LISTING_URL)
    }

    /// Resolve a discovered link against this site, in rule order:
    /// scheme-qualified links pass through, protocol-relative links get
    /// `https:`, root-relative links get the origin, and anything else is
    /// resolved under the listing page's base path.
    fn normalize_url(&self, link: &str) -> String {
        if has_scheme(link) {
            link.to_string()
        } else if let Some(rest) = link.strip_prefix("//") {
            format!("https://{rest}")
        } else if link.starts_with('/') {
            format!("{}{link}", self.origin)
        } else {
            format!("{}{link}", self.base_path)
        }
    }

    /// Extract one record from a list item or term/definition element.
    fn extract_item(&self, item: ElementRef<'_>) -> Option<NewsRecord> {
        let anchor = item.select(&ANCHOR).next()?;
        let mut title = element_text(anchor);
        if title.is_empty() {
            // Truncated headlines often keep the full text in the title attr.
            title = anchor.value().attr("title").unwrap_or("").trim().to_string();
        }
        let href = anchor.value().attr("href").unwrap_or("");
        if title.is_empty() || href.is_empty() {
            return None;
        }

        let image_url = item
            .select(&IMG)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| self.normalize_url(src))
            .unwrap_or_default();

        Some(NewsRecord {
            image_url,
            title,
            source: self.site_name.clone(),
            url: self.normalize_url(href),
        })
    }

    fn parse(&self, html: &str) -> Vec<NewsRecord> {
        let document = Html::parse_document(html);
        let mut seen: HashSet<NewsRecord> = HashSet::new();
        let mut records = Vec::new();
        for item in document.select(&LIST_ITEM) {
            if let Some(record) = self.extract_item(item) {
                // dt/dd twins describe the same entry; keep the first.
                if seen.insert(record.clone()) {
                    records.push(record);
                }
            }
        }
        records
    }
}

impl SourceAdapter for StaticListingAdapter {
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
        if page > 1 {
            warn!(page, site = %self.site_name, "Static listing has no pagination; fetching first page");
        }
        info!(site = %self.site_name, url = %self.listing_url, "Fetching static listing");

        let html = fetcher.get(&self.listing_url, &[], None)?;
        let mut records = self.parse(&html);
        if !keyword.is_empty() {
            records.retain(|record| record.title.contains(keyword));
        }
        info!(count = records.len(), "Static listing parsed");
        Ok(records)
    }
}
