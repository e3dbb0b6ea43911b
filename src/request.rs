//! Validated scrape request. Both front ends (arguments and interactive prompts) build a
//! [ScrapeRequest] through these parsers and hand it to the same run function.

use crate::formats::ExportFormat;
use crate::model::{EntryId, Finish, Language, RangeError, ScrapeRange};
use reqwest::Url;
use thiserror::Error;

/// Input validation errors. The run does not start when one of these occurs.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Start must be a whole number, got '{0}'")]
    InvalidStart(String),

    #[error("Finish must be a number or 'end'/'END', got '{0}'")]
    InvalidFinish(String),

    #[error("Finish number must be at least 1")]
    FinishBelowOne,

    #[error("{0}")]
    Range(#[from] RangeError),

    #[error("Invalid language '{0}'. Use en or jp.")]
    InvalidLanguage(String),

    #[error("Invalid format '{0}'. Use txt, html, or both.")]
    InvalidFormat(String),

    #[error("Input ended before all values were entered.")]
    InputEnded,

    #[error("Could not read input: {0}")]
    Input(#[from] std::io::Error),
}

/// Everything the core needs for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    /// Script page URL without fragment.
    pub base_url: Url,
    pub range: ScrapeRange,
    pub language: Language,
    pub format: ExportFormat,
}

/// Parse the script page URL: http(s) with a host. Any `#anchor` is dropped.
pub fn parse_base_url(s: &str) -> Result<Url, RequestError> {
    let s = s.trim();
    let invalid = |reason: String| RequestError::InvalidUrl {
        input: s.to_string(),
        reason,
    };
    let mut url = Url::parse(s).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("URL has no host".to_string()));
    }
    url.set_fragment(None);
    Ok(url)
}

pub fn parse_start(s: &str) -> Result<EntryId, RequestError> {
    let s = s.trim();
    let n: i64 = s
        .parse()
        .map_err(|_| RequestError::InvalidStart(s.to_string()))?;
    if n < 1 {
        return Err(RangeError::StartBelowOne.into());
    }
    EntryId::try_from(n).map_err(|_| RequestError::InvalidStart(s.to_string()))
}

/// A positive id, or `end` in any letter case for an unbounded range.
pub fn parse_finish(s: &str) -> Result<Finish, RequestError> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("end") {
        return Ok(Finish::Unbounded);
    }
    let n: i64 = s
        .parse()
        .map_err(|_| RequestError::InvalidFinish(s.to_string()))?;
    if n < 1 {
        return Err(RequestError::FinishBelowOne);
    }
    EntryId::try_from(n)
        .map(Finish::Concrete)
        .map_err(|_| RequestError::InvalidFinish(s.to_string()))
}

pub fn parse_language(s: &str) -> Result<Language, RequestError> {
    match s.trim().to_lowercase().as_str() {
        "en" => Ok(Language::English),
        "jp" => Ok(Language::Japanese),
        _ => Err(RequestError::InvalidLanguage(s.to_string())),
    }
}

pub fn parse_format(s: &str) -> Result<ExportFormat, RequestError> {
    match s.trim().to_lowercase().as_str() {
        "txt" => Ok(ExportFormat::Txt),
        "html" => Ok(ExportFormat::Html),
        "both" => Ok(ExportFormat::Both),
        _ => Err(RequestError::InvalidFormat(s.to_string())),
    }
}

impl ScrapeRequest {
    /// Validate raw start/finish tokens against each other and assemble the request.
    pub fn new(
        base_url: &str,
        start: &str,
        finish: &str,
        language: Language,
        format: ExportFormat,
    ) -> Result<Self, RequestError> {
        let base_url = parse_base_url(base_url)?;
        let range = ScrapeRange::new(parse_start(start)?, parse_finish(finish)?)?;
        Ok(Self {
            base_url,
            range,
            language,
            format,
        })
    }
}
