//! # News Harvester
//!
//! Ingests news listings from external search and index pages, then
//! deep-collects full article content with persisted, self-correcting
//! extraction rules.
//!
//! ## Pipeline
//!
//! 1. **Listing**: a [`scrapers::SourceAdapter`] builds the request, the
//!    [`fetcher::Fetcher`] retrieves raw markup, and the heuristic
//!    [`listing`] parser turns it into [`models::NewsRecord`]s.
//! 2. **Dedup**: [`orchestrate::run_listing_cycle`] drops invalid records,
//!    skips URLs the store already holds, and persists the rest.
//! 3. **Deep collection**: [`rules::RuleEngine::collect_by_source`] resolves
//!    a per-source [`models::ExtractionRule`], applies its selectors, and
//!    falls back to auto-discovery — optionally writing the discovered
//!    selector back so the rule heals itself.
//!
//! ## Failure tiers
//!
//! Transport problems are hard failures ([`error::FetchError`]): a listing
//! call either returns the whole parsed page or nothing. Extraction
//! problems are soft: listing parsing degrades to an empty sequence and
//! deep collection embeds a failure marker in its returned string, because
//! batches must survive individual bad pages.
//!
//! All I/O is synchronous and blocking; callers needing concurrency run
//! independent scraper instances.

pub mod deep;
pub mod error;
pub mod fetcher;
pub mod listing;
pub mod models;
pub mod orchestrate;
pub mod rules;
pub mod scrape;
pub mod scrapers;
pub mod store;

pub use deep::COLLECT_FAILURE_PREFIX;
pub use error::{FetchError, SelectorError};
pub use fetcher::Fetcher;
pub use models::{DeepContent, ExtractionRule, NewsRecord};
pub use orchestrate::{CollectReport, CollectStatus, ListingOutcome};
pub use rules::{RuleEngine, RuleStore, DEFAULT_COLLECT_PREFIX};
pub use scrape::NewsScraper;
pub use scrapers::{SourceAdapter, SourceKind};
pub use store::{MemoryNewsStore, MemoryRuleStore, NewsStore, StoredRecord};
