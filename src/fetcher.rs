//! Blocking HTTP fetcher with browser-emulating headers.
//!
//! One [`Fetcher`] is held per scraper instance and reused for every request
//! in a scraping session. It carries a fixed set of browser-like default
//! headers and a 10-second timeout; per-rule headers can be layered on top
//! of the defaults for individual requests. Character decoding relies on the
//! transport's content-negotiated encoding (`Response::text`), nothing more.
//!
//! The fetcher is the hard-failure tier: timeouts and non-2xx statuses
//! surface as [`FetchError`] and are never papered over with partial
//! content. Reuse is sequential only; the fetcher makes no claim of being
//! safe for concurrent use.

use crate::error::FetchError;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,\
    image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9";
const BROWSER_ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9";
const BROWSER_REFERER: &str = "https://news.baidu.com/";

/// A persistent blocking client configured to look like a desktop browser.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher with browser default headers and the fixed timeout.
    pub fn new() -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
        );
        headers.insert(REFERER, HeaderValue::from_static(BROWSER_REFERER));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Issue a GET and return the decoded body text.
    ///
    /// `params` are appended as query parameters; `extra_headers` (typically
    /// from an extraction rule) override the browser defaults for this one
    /// request. Fails with [`FetchError`] on transport errors, timeout, or
    /// any non-2xx status.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        extra_headers: Option<&HashMap<String, String>>,
    ) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(headers) = extra_headers {
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        let response = request.send()?;
        let status = response.status();
        let final_url = response.url().to_string();
        debug!(%status, %final_url, "Received response");

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: final_url,
            });
        }

        // Decoding follows the response's negotiated charset.
        let body = response.text()?;
        info!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}
