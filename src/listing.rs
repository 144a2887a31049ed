//! Heuristic listing-page parser.
//!
//! Search listing markup drifts constantly, so the parser works in two
//! passes: it first narrows to `div` containers whose class attribute
//! contains the `result` marker, and only if none exist does it widen to
//! every classed `div` on the page, trading precision for recall. Each
//! candidate container yields at most one [`NewsRecord`]; containers with
//! no anchor, or an anchor missing text or target, are skipped.
//!
//! This layer is soft-failing by contract: malformed markup produces an
//! empty sequence, never an error.

use crate::models::NewsRecord;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

/// Class-attribute substring that marks a search-result container.
const RESULT_CLASS_MARKER: &str = "result";

/// Labelled fragments shorter than this are considered for the
/// source/timestamp classification.
const LABEL_MAX_CHARS: usize = 50;

/// Substrings that mark a short fragment as a timestamp rather than a
/// source label.
const DATE_MARKERS: [&str; 4] = ["年", "月", "日", ":"];

static DIV: Lazy<Selector> = Lazy::new(|| Selector::parse("div").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span").unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Collapse an element's descendant text, trimming every fragment.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// Parse a listing page into records using the ordered container strategy.
pub fn extract_records(html: &str) -> Vec<NewsRecord> {
    let document = Html::parse_document(html);

    let marked: Vec<ElementRef<'_>> = document
        .select(&DIV)
        .filter(|div| {
            div.value()
                .attr("class")
                .is_some_and(|class| class.contains(RESULT_CLASS_MARKER))
        })
        .collect();
    debug!(count = marked.len(), "Containers with result marker class");

    let candidates: Vec<ElementRef<'_>> = if marked.is_empty() {
        // Broad net: any classed div. Degrades precision, keeps recall.
        let broad: Vec<ElementRef<'_>> = document
            .select(&DIV)
            .filter(|div| div.value().attr("class").is_some())
            .collect();
        debug!(count = broad.len(), "Fell back to all classed containers");
        broad
    } else {
        marked
    };

    let records: Vec<NewsRecord> = candidates
        .into_iter()
        .filter_map(extract_record)
        .collect();
    info!(count = records.len(), "Extracted listing records");
    records
}

/// Extract a single record from one candidate container.
///
/// Returns `None` when the container is unusable: no anchor, or the anchor
/// has empty text or an empty link target.
fn extract_record(item: ElementRef<'_>) -> Option<NewsRecord> {
    let anchor = item.select(&ANCHOR).next()?;
    let title = element_text(anchor);
    let url = anchor.value().attr("href").unwrap_or("").to_string();
    if title.is_empty() || url.is_empty() {
        return None;
    }

    // First short labelled fragment decides source vs. timestamp; only a
    // source label is kept on the record.
    let mut source = String::new();
    for span in item.select(&SPAN) {
        let text = element_text(span);
        if text.is_empty() || text.chars().count() >= LABEL_MAX_CHARS {
            continue;
        }
        if !DATE_MARKERS.iter().any(|marker| text.contains(marker)) {
            source = text;
        }
        break;
    }

    let image_url = item
        .select(&IMG)
        .next()
        .and_then(|img| img.value().attr("src"))
        .unwrap_or("")
        .to_string();

    debug!(
        title = %truncate(&title, 30),
        %source,
        url = %truncate(&url, 50),
        "Parsed listing entry"
    );

    Some(NewsRecord {
        image_url,
        title,
        source,
        url,
    })
}

/// Truncate a string to `max` characters for log lines.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}…")
    }
}
