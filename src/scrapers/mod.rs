//! Source adapters for fetching listings from external sites.
//!
//! Every supported site implements the same capability: turn a keyword and
//! page number into an ordered sequence of [`NewsRecord`]s. The two shapes
//! in play are:
//!
//! | Variant | Module | Pagination | Keyword handling |
//! |---------|--------|------------|------------------|
//! | Search listing | [`search`] | server-side, `pn = (page-1)*10` | sent as a query parameter |
//! | Static listing | [`static_list`] | first page only | post-hoc substring filter over titles |
//!
//! Adapters are selected by the tagged [`SourceKind`] identifier rather
//! than by structural similarity, so adding a site means adding a variant
//! and a constructor arm.

use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::models::NewsRecord;
use clap::ValueEnum;

pub mod search;
pub mod static_list;

pub use search::SearchAdapter;
pub use static_list::StaticListingAdapter;

/// Capability shared by all listing sources.
///
/// Implementations either return the full parsed listing or fail with a
/// [`FetchError`]; they never return partially-constructed records.
pub trait SourceAdapter {
    /// Human-readable name of the site this adapter targets.
    fn site_name(&self) -> &str;

    /// Fetch one listing page and parse it into records.
    fn fetch(
        &self,
        fetcher: &Fetcher,
        keyword: &str,
        page: u32,
    ) -> Result<Vec<NewsRecord>, FetchError>;
}

/// Tag selecting which adapter variant serves a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Baidu news search listing.
    Search,
    /// Chengdu municipal government news index.
    Static,
}

impl SourceKind {
    /// Build the adapter for this source tag.
    pub fn adapter(self) -> Box<dyn SourceAdapter> {
        match self {
            SourceKind::Search => Box::new(SearchAdapter::baidu_news()),
            SourceKind::Static => Box::new(StaticListingAdapter::chengdu_gov()),
        }
    }
}
