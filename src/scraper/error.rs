//! Shared error type for the fetch and parse layers.

use crate::model::EntryId;
use thiserror::Error;

/// Errors from building the HTTP client, talking to the TrailsDB API, and reading table markup.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Could not create HTTP client: {source}")]
    Client { source: reqwest::Error },

    // HTTP and network
    #[error("Network error: could not reach {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead { url: String, source: reqwest::Error },

    #[error("Unexpected response from TrailsDB API at {url}: {reason}")]
    ApiResponse { url: String, reason: String },

    // Parsing
    #[error("Could not read entry {id}: {reason}")]
    Parse { id: EntryId, reason: String },
}
