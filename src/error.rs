//! Error types for the hard-failure tier.
//!
//! The crate splits failures into two tiers: transport-level problems
//! (unreachable host, non-2xx status, timeout) surface as a typed
//! [`FetchError`] and abort the whole listing call, while parse-level
//! problems are absorbed inside the extraction modules and degrade to an
//! empty result or a failure marker string. See the module docs on
//! [`crate::deep`] and [`crate::listing`] for the soft tier.

use reqwest::StatusCode;
use thiserror::Error;

/// A hard failure raised by the [`Fetcher`](crate::fetcher::Fetcher).
///
/// Listing fetches are all-or-nothing per call: a `FetchError` means no
/// partial listing was produced.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not complete (DNS, connect, timeout, decode).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected status {status} fetching {url}")]
    Status { status: StatusCode, url: String },
}

/// A selector string that could not be understood or translated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// The selector string was empty.
    #[error("empty selector")]
    Empty,

    /// An attribute-path step used a predicate shape the translator does
    /// not support (multiple predicates, positional indexes, attributes
    /// other than `class`/`id`).
    #[error("unsupported predicate in attribute-path selector: {0}")]
    Unsupported(String),

    /// The translated (or native) string is not a valid CSS selector.
    #[error("invalid selector: {0}")]
    Invalid(String),
}
