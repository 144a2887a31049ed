//! Deep content extraction for article detail pages.
//!
//! Deep collection runs over batches of records, so this layer never raises:
//! any failure is embedded in the returned string as a human-readable marker
//! rather than propagated, letting the rest of a batch proceed.
//!
//! Extraction walks an ordered chain of strategies and the first one that
//! produces non-empty text wins. The chain is kept as data
//! ([`STRATEGIES`]) so adding a markup shape means appending an entry, not
//! threading another branch through the code.

use crate::fetcher::Fetcher;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{info, instrument, warn};

/// Marker prefixed to the returned string when collection fails.
pub const COLLECT_FAILURE_PREFIX: &str = "深度采集失败: ";

/// Common article-container selectors, tried in order.
pub(crate) const CONTENT_CONTAINERS: [&str; 12] = [
    "div.article-content",
    "div.content",
    "div#content",
    "article",
    "div.main-content",
    "div.news-content",
    "div.article-body",
    "div.content-body",
    "div.content_detail",
    "div.article-text",
    "div.detail-content",
    "div.detail_content",
];

/// Paragraphs longer than this count as body text in the whole-document
/// sweep.
const LONG_PARAGRAPH_CHARS: usize = 50;

/// Upper bound on the raw-body fallback.
const BODY_TEXT_LIMIT: usize = 1000;

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

type Strategy = fn(&Html) -> Option<String>;

/// Ordered extraction strategies; first non-empty result wins.
static STRATEGIES: [(&str, Strategy); 3] = [
    ("known-containers", by_known_containers),
    ("long-paragraphs", by_long_paragraphs),
    ("body-text", by_body_text),
];

/// Fetch one article page and extract its main text.
///
/// Never fails: transport errors come back as a marker string starting with
/// [`COLLECT_FAILURE_PREFIX`] and carrying the cause.
#[instrument(level = "info", skip_all, fields(%url))]
pub fn deep_collect(fetcher: &Fetcher, url: &str) -> String {
    match fetcher.get(url, &[], None) {
        Ok(html) => {
            let content = extract_content(&html);
            info!(bytes = content.len(), "Deep collection finished");
            content
        }
        Err(e) => {
            warn!(error = %e, "Deep collection failed");
            format!("{COLLECT_FAILURE_PREFIX}{e}")
        }
    }
}

/// Run the strategy chain over parsed markup.
pub(crate) fn extract_content(html: &str) -> String {
    let document = Html::parse_document(html);
    for (name, strategy) in &STRATEGIES {
        if let Some(content) = strategy(&document) {
            if !content.is_empty() {
                info!(strategy = name, "Content strategy matched");
                return content;
            }
        }
    }
    String::new()
}

/// Join the non-empty paragraph texts of the first element matching the
/// selector.
pub(crate) fn first_container_paragraphs(document: &Html, selector: &Selector) -> Option<String> {
    let container = document.select(selector).next()?;
    let paragraphs: Vec<String> = container
        .select(&PARAGRAPH)
        .map(|p| p.text().map(str::trim).collect::<String>())
        .filter(|text| !text.is_empty())
        .collect();
    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n"))
    }
}

/// First matching known container wins; its paragraphs are the content.
fn by_known_containers(document: &Html) -> Option<String> {
    for css in CONTENT_CONTAINERS {
        let selector = Selector::parse(css).ok()?;
        if let Some(content) = first_container_paragraphs(document, &selector) {
            return Some(content);
        }
    }
    None
}

/// Whole-document sweep for substantial paragraphs.
fn by_long_paragraphs(document: &Html) -> Option<String> {
    let paragraphs: Vec<String> = document
        .select(&PARAGRAPH)
        .map(|p| p.text().map(str::trim).collect::<String>())
        .filter(|text| text.chars().count() > LONG_PARAGRAPH_CHARS)
        .collect();
    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n"))
    }
}

/// Last resort: raw body text, bounded.
fn by_body_text(document: &Html) -> Option<String> {
    let body = document.select(&BODY).next()?;
    let text: String = body.text().map(str::trim).collect();
    Some(text.chars().take(BODY_TEXT_LIMIT).collect())
}
