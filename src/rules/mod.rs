//! Rule-guided deep extraction with self-correcting auto-discovery.
//!
//! A persisted [`ExtractionRule`] names a title selector and a content
//! selector for one site. The engine resolves a record's source to a rule by
//! case-insensitive substring match, applies the rule's selectors, and when
//! a selector extracts nothing it falls back to probing common markup
//! patterns. A successful probe can be written back through the rule store,
//! so a site whose markup drifted heals itself on the next collection.
//!
//! Like the plain extractor in [`crate::deep`], everything here is
//! non-raising: failures come back as marker strings, never as errors.

use crate::deep::{self, first_container_paragraphs, COLLECT_FAILURE_PREFIX, CONTENT_CONTAINERS};
use crate::fetcher::Fetcher;
use crate::models::ExtractionRule;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{info, instrument, warn};

pub mod selector;

/// Marker prefixed to results produced without a matching rule.
pub const DEFAULT_COLLECT_PREFIX: &str = "[默认采集] ";

/// Title probes tried in order when a rule's title selector comes up empty.
const TITLE_PROBES: [&str; 6] = [
    "h1.article-title",
    "h1.title",
    "h2.article-title",
    "h2.title",
    "h1",
    "h2",
];

/// Selector for the document's page title, the last title resort.
const PAGE_TITLE: &str = "title";

/// Subset of the common content containers probed during auto-discovery.
const CONTENT_PROBES: [&str; 7] = [
    CONTENT_CONTAINERS[0],
    CONTENT_CONTAINERS[1],
    CONTENT_CONTAINERS[2],
    CONTENT_CONTAINERS[3],
    CONTENT_CONTAINERS[4],
    CONTENT_CONTAINERS[5],
    CONTENT_CONTAINERS[6],
];

static PAGE_TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(PAGE_TITLE).unwrap());

/// Store of persisted extraction rules.
///
/// `update_rule` must be a single atomic conditional update: find the first
/// matching rule and apply the non-`None` fields in one serialized
/// operation, so two concurrent auto-discoveries cannot interleave a read
/// and a write and silently drop one another's selector.
pub trait RuleStore {
    /// First rule whose `site_name` contains `source`, case-insensitively.
    fn find_rule(&self, source: &str) -> Option<ExtractionRule>;

    /// Update the first matching rule's non-`None` selectors. Returns
    /// `false` when no rule matched (a no-op, not an error).
    fn update_rule(
        &self,
        source: &str,
        title_selector: Option<&str>,
        content_selector: Option<&str>,
    ) -> bool;
}

/// What one rule application produced, including any selectors that
/// auto-discovery had to find on its own.
#[derive(Debug, Default)]
struct Extraction {
    title: String,
    content: String,
    discovered_title: Option<String>,
    discovered_content: Option<String>,
}

/// Rule-guided extraction over one fetcher and one rule store.
pub struct RuleEngine<'a> {
    fetcher: &'a Fetcher,
    rules: &'a dyn RuleStore,
}

impl<'a> RuleEngine<'a> {
    pub fn new(fetcher: &'a Fetcher, rules: &'a dyn RuleStore) -> Self {
        Self { fetcher, rules }
    }

    /// Collect one page with explicit selectors.
    ///
    /// Returns `"title\ncontent"` when a title was found, the content alone
    /// otherwise. Never fails; transport errors come back as a
    /// failure-marker string.
    pub fn deep_collect_with_rule(
        &self,
        url: &str,
        title_selector: &str,
        content_selector: &str,
        source: Option<&str>,
        update_rule: bool,
    ) -> String {
        self.collect_inner(url, title_selector, content_selector, None, source, update_rule)
    }

    /// Outward-facing entry point: resolve `source` to a rule and collect.
    ///
    /// Without a matching rule the plain heuristic extractor runs instead
    /// and its result is prefixed with [`DEFAULT_COLLECT_PREFIX`].
    #[instrument(level = "info", skip_all, fields(%url, %source))]
    pub fn collect_by_source(&self, url: &str, source: &str, update_rule: bool) -> String {
        match self.rules.find_rule(source) {
            Some(rule) => {
                info!(site = %rule.site_name, "Collecting with extraction rule");
                self.collect_inner(
                    url,
                    &rule.title_selector,
                    &rule.content_selector,
                    rule.request_headers.as_ref(),
                    Some(source),
                    update_rule,
                )
            }
            None => {
                info!("No rule matched source; using default extraction");
                let content = deep::deep_collect(self.fetcher, url);
                if content.starts_with(COLLECT_FAILURE_PREFIX) {
                    // A failure marker must stay recognizable to batch
                    // reporting; only successful extractions get the prefix.
                    return content;
                }
                format!("{DEFAULT_COLLECT_PREFIX}{content}")
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(%url, update_rule))]
    fn collect_inner(
        &self,
        url: &str,
        title_selector: &str,
        content_selector: &str,
        headers: Option<&std::collections::HashMap<String, String>>,
        source: Option<&str>,
        update_rule: bool,
    ) -> String {
        let html = match self.fetcher.get(url, &[], headers) {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Rule-guided collection failed to fetch");
                return format!("{COLLECT_FAILURE_PREFIX}{e}");
            }
        };

        let extraction = extract_with_rule(&html, title_selector, content_selector);
        write_back(self.rules, source, update_rule, &extraction);
        compose_result(&extraction)
    }
}

/// Apply (possibly dialect-translated) selectors, then auto-discover
/// whatever came up empty.
fn extract_with_rule(html: &str, title_selector: &str, content_selector: &str) -> Extraction {
    let document = Html::parse_document(html);
    let mut extraction = Extraction {
        title: select_first_text(&document, title_selector),
        content: select_all_text(&document, content_selector),
        ..Extraction::default()
    };

    if extraction.title.is_empty() {
        if let Some((css, title)) = discover_title(&document) {
            info!(selector = %css, "Auto-discovered title selector");
            extraction.title = title;
            extraction.discovered_title = Some(css);
        }
    }
    if extraction.content.is_empty() {
        if let Some((css, content)) = discover_content(&document) {
            info!(selector = %css, "Auto-discovered content selector");
            extraction.content = content;
            extraction.discovered_content = Some(css);
        }
    }
    extraction
}

/// Text of the first element matched by a rule selector; empty on any
/// translation failure or miss.
fn select_first_text(document: &Html, rule_selector: &str) -> String {
    let Some(sel) = resolve_selector(rule_selector) else {
        return String::new();
    };
    document
        .select(&sel)
        .next()
        .map(|el| el.text().map(str::trim).collect())
        .unwrap_or_default()
}

/// Newline-joined text of every element matched by a rule selector.
fn select_all_text(document: &Html, rule_selector: &str) -> String {
    let Some(sel) = resolve_selector(rule_selector) else {
        return String::new();
    };
    let pieces: Vec<String> = document
        .select(&sel)
        .map(|el| el.text().map(str::trim).collect::<String>())
        .filter(|text| !text.is_empty())
        .collect();
    pieces.join("\n")
}

fn resolve_selector(rule_selector: &str) -> Option<Selector> {
    match selector::resolve(rule_selector) {
        Ok(css) => Selector::parse(&css).ok(),
        Err(e) => {
            warn!(selector = %rule_selector, error = %e, "Selector did not translate");
            None
        }
    }
}

/// Probe common title containers, then the page title.
fn discover_title(document: &Html) -> Option<(String, String)> {
    for css in TITLE_PROBES {
        let sel = Selector::parse(css).ok()?;
        if let Some(el) = document.select(&sel).next() {
            let text: String = el.text().map(str::trim).collect();
            if !text.is_empty() {
                return Some((css.to_string(), text));
            }
        }
    }
    let page_title: String = document
        .select(&PAGE_TITLE_SELECTOR)
        .next()
        .map(|el| el.text().map(str::trim).collect())
        .unwrap_or_default();
    if page_title.is_empty() {
        None
    } else {
        Some((PAGE_TITLE.to_string(), page_title))
    }
}

/// Probe common content containers, joining their paragraph text.
fn discover_content(document: &Html) -> Option<(String, String)> {
    for css in CONTENT_PROBES {
        let sel = Selector::parse(css).ok()?;
        if let Some(content) = first_container_paragraphs(document, &sel) {
            return Some((css.to_string(), content));
        }
    }
    None
}

/// Persist auto-discovered selectors when asked to and a source is known.
fn write_back(store: &dyn RuleStore, source: Option<&str>, update_rule: bool, extraction: &Extraction) {
    if !update_rule {
        return;
    }
    let Some(source) = source else { return };
    if extraction.discovered_title.is_none() && extraction.discovered_content.is_none() {
        return;
    }

    let updated = store.update_rule(
        source,
        extraction.discovered_title.as_deref(),
        extraction.discovered_content.as_deref(),
    );
    if updated {
        info!(%source, "Wrote auto-discovered selectors back to rule store");
    } else {
        info!(%source, "No stored rule matched source; discovery not persisted");
    }
}

/// Combine title and content per the return contract.
fn compose_result(extraction: &Extraction) -> String {
    if extraction.title.is_empty() {
        extraction.content.clone()
    } else {
        format!("{}\n{}", extraction.title, extraction.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRuleStore;

    const ARTICLE: &str = r#"
        <html><head><title>页面标题 - 新闻站</title></head><body>
        <h1 class="headline">规则命中的标题</h1>
        <div class="article-content">
            <p>正文第一段。</p>
            <p>正文第二段。</p>
        </div>
        </body></html>
    "#;

    fn rule(site_name: &str) -> ExtractionRule {
        ExtractionRule {
            site_name: site_name.to_string(),
            site_url: format!("https://{site_name}.example.com"),
            title_selector: "h1.headline".to_string(),
            content_selector: "div.article-content p".to_string(),
            request_headers: None,
        }
    }

    #[test]
    fn test_extract_with_matching_selectors() {
        let extraction = extract_with_rule(ARTICLE, "h1.headline", "div.article-content p");
        assert_eq!(extraction.title, "规则命中的标题");
        assert_eq!(extraction.content, "正文第一段。\n正文第二段。");
        assert!(extraction.discovered_title.is_none());
        assert!(extraction.discovered_content.is_none());
    }

    #[test]
    fn test_extract_with_attr_path_selectors() {
        let extraction = extract_with_rule(
            ARTICLE,
            r#"//h1[@class="headline"]"#,
            r#"//div[@class="article-content"]//p"#,
        );
        assert_eq!(extraction.title, "规则命中的标题");
        assert_eq!(extraction.content, "正文第一段。\n正文第二段。");
    }

    #[test]
    fn test_auto_discovery_on_stale_selectors() {
        let extraction = extract_with_rule(ARTICLE, "h1.gone", "div.gone");
        assert_eq!(extraction.title, "规则命中的标题");
        assert_eq!(extraction.discovered_title.as_deref(), Some("h1"));
        assert_eq!(extraction.content, "正文第一段。\n正文第二段。");
        assert_eq!(
            extraction.discovered_content.as_deref(),
            Some("div.article-content")
        );
    }

    #[test]
    fn test_page_title_is_last_title_resort() {
        let html = r#"
            <html><head><title>兜底页面标题</title></head>
            <body><div class="content"><p>只有正文，没有任何标题元素可供探测使用。</p></div></body></html>
        "#;
        let extraction = extract_with_rule(html, "h1.gone", "div.content p");
        assert_eq!(extraction.title, "兜底页面标题");
        assert_eq!(extraction.discovered_title.as_deref(), Some("title"));
    }

    #[test]
    fn test_compose_result_with_and_without_title() {
        let with_title = Extraction {
            title: "标题".to_string(),
            content: "正文".to_string(),
            ..Extraction::default()
        };
        assert_eq!(compose_result(&with_title), "标题\n正文");

        let no_title = Extraction {
            content: "正文".to_string(),
            ..Extraction::default()
        };
        assert_eq!(compose_result(&no_title), "正文");
    }

    #[test]
    fn test_write_back_updates_matching_rule() {
        let store = MemoryRuleStore::new(vec![rule("川观新闻")]);
        let extraction = Extraction {
            title: "t".to_string(),
            content: "c".to_string(),
            discovered_title: Some("h1".to_string()),
            discovered_content: None,
        };
        write_back(&store, Some("川观"), true, &extraction);
        let updated = store.find_rule("川观").unwrap();
        assert_eq!(updated.title_selector, "h1");
        // Untouched field keeps its value.
        assert_eq!(updated.content_selector, "div.article-content p");
    }

    #[test]
    fn test_write_back_is_noop_without_flag_or_source() {
        let store = MemoryRuleStore::new(vec![rule("川观新闻")]);
        let extraction = Extraction {
            discovered_title: Some("h1".to_string()),
            ..Extraction::default()
        };
        write_back(&store, Some("川观"), false, &extraction);
        write_back(&store, None, true, &extraction);
        assert_eq!(store.find_rule("川观").unwrap().title_selector, "h1.headline");
    }

    #[test]
    fn test_write_back_unmatched_source_is_silent_noop() {
        let store = MemoryRuleStore::new(vec![rule("川观新闻")]);
        let extraction = Extraction {
            discovered_content: Some("div.content".to_string()),
            ..Extraction::default()
        };
        // Must not panic or error; an unmatched source is a logged no-op.
        write_back(&store, Some("不存在的来源"), true, &extraction);
    }

    #[test]
    fn test_collect_by_source_failure_keeps_marker_unprefixed() {
        let fetcher = Fetcher::new().unwrap();
        let store = MemoryRuleStore::default();
        let engine = RuleEngine::new(&fetcher, &store);

        // Port 1 refuses the connection, so the default extraction fails.
        let result = engine.collect_by_source("http://127.0.0.1:1/article", "未知来源", false);
        assert!(result.starts_with(COLLECT_FAILURE_PREFIX));
        assert!(!result.starts_with(DEFAULT_COLLECT_PREFIX));
    }

    #[test]
    fn test_untranslatable_selector_degrades_to_discovery() {
        let extraction = extract_with_rule(ARTICLE, r#"//div[@class="a" and @id="b"]"#, "div.article-content p");
        // Bad selector behaves as a miss; discovery still finds the title.
        assert_eq!(extraction.title, "规则命中的标题");
        assert!(extraction.discovered_title.is_some());
    }
}
