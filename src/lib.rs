//! trailscrape: CLI scraper for Trails in the Database game scripts, outputting TXT and HTML.

pub mod cli;
pub mod config;
pub mod formats;
pub mod interactive;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod request;
pub mod scraper;

// Re-exports for CLI and consumers.
pub use formats::{export, write_html, write_text, ExportFormat, FormatError};
pub use model::{
    EntryId, Finish, FormattedLine, Language, ParsedEntry, RangeError, ScrapeOutcome, ScrapeRange,
    Skip, SkipCause, TerminalReason,
};
pub use request::{RequestError, ScrapeRequest};
pub use scraper::{
    parse_entry, scrape, ApiFetcher, Fetcher, HttpFetcher, HttpFetcherBuilder, RawFetchResult,
    ScrapeOptions, ScrapePolicy, ScraperError, Source,
};
