//! Blocking HTTP fetcher: one GET per entry id, no retries of its own.

use crate::model::EntryId;
use crate::scraper::error::ScraperError;
use crate::scraper::{Fetcher, RawFetchResult};
use reqwest::StatusCode;
use reqwest::Url;
use std::time::Duration;

pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) trailscrape/0.1";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_REDIRECTS: usize = 10;

/// Request target for one entry: the base URL with the id as its fragment.
pub fn entry_url(base_url: &Url, id: EntryId) -> Url {
    let mut url = base_url.clone();
    url.set_fragment(Some(&id.to_string()));
    url
}

/// Build the blocking reqwest client shared by the page and API fetchers.
pub(crate) fn build_http_client(
    user_agent: Option<String>,
    timeout_secs: u64,
) -> Result<reqwest::blocking::Client, ScraperError> {
    let user_agent = user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
    reqwest::blocking::Client::builder()
        .cookie_store(true)
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| ScraperError::Client { source: e })
}

/// Map a response to a fetch result. 404/410 mean the entry does not exist; any other
/// non-success status or an unreadable body is transient.
fn classify_response(response: reqwest::blocking::Response, url: &str) -> RawFetchResult {
    let status = response.status();
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return RawFetchResult::NotFound;
    }
    if !status.is_success() {
        return RawFetchResult::TransientError(
            ScraperError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .to_string(),
        );
    }
    match response.text() {
        Ok(body) => RawFetchResult::Body(body),
        Err(e) => RawFetchResult::TransientError(
            ScraperError::BodyRead {
                url: url.to_string(),
                source: e,
            }
            .to_string(),
        ),
    }
}

/// Fetches the script page over HTTP for every entry id.
#[derive(Debug)]
pub struct HttpFetcher {
    inner: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Fetcher with the default User-Agent and timeout.
    pub fn new() -> Result<Self, ScraperError> {
        Self::builder().build()
    }

    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::default()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&mut self, base_url: &Url, id: EntryId) -> RawFetchResult {
        let url = entry_url(base_url, id);
        log::trace!("GET {}", url);
        match self.inner.get(url.clone()).send() {
            Ok(response) => classify_response(response, url.as_str()),
            Err(e) => RawFetchResult::TransientError(
                ScraperError::Network {
                    url: url.to_string(),
                    source: e,
                }
                .to_string(),
            ),
        }
    }
}

/// Builder for [HttpFetcher] with optional User-Agent and timeout.
#[derive(Debug)]
pub struct HttpFetcherBuilder {
    user_agent: Option<String>,
    timeout_secs: u64,
}

impl Default for HttpFetcherBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpFetcherBuilder {
    /// Set a custom User-Agent. If not set, a browser-like default is used.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set request timeout in seconds. Default 10.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    pub fn build(self) -> Result<HttpFetcher, ScraperError> {
        Ok(HttpFetcher {
            inner: build_http_client(self.user_agent, self.timeout_secs)?,
        })
    }
}
