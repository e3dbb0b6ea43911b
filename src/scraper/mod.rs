//! Fetching, parsing, and the range scraping loop.
//!
//! [scrape] walks an id range one id at a time: fetch (with retry), parse, normalize, and decide
//! whether to stop. Per-id failures are recorded in the outcome and never abort the call.

mod api;
mod client;
mod error;
mod parse;

pub use api::{api_url, ApiFetcher, ScriptRow};
pub use client::{entry_url, HttpFetcher, HttpFetcherBuilder};
pub use error::ScraperError;
pub use parse::parse_entry;

use crate::model::{
    EntryId, Finish, FormattedLine, Language, ScrapeOutcome, ScrapeRange, Skip, SkipCause,
    TerminalReason,
};
use crate::normalize::normalize;
use reqwest::Url;
use std::time::Duration;

/// Where entry markup comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The game-scripts page itself, one request per id.
    Page,
    /// The TrailsDB script API, downloaded once per run.
    Api,
}

/// Result of a single fetch attempt for one id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFetchResult {
    Body(String),
    /// The source says the entry does not exist. Not retried.
    NotFound,
    /// Network or HTTP failure; the cause is kept for reporting.
    TransientError(String),
}

/// Source of per-id markup. Implementations make one attempt per call; retrying is the loop's job.
pub trait Fetcher {
    fn fetch(&mut self, base_url: &Url, id: EntryId) -> RawFetchResult;
}

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MISSING_LIMIT: u32 = 10;
pub const DEFAULT_FETCH_FAILURE_LIMIT: u32 = 10;

/// Retry budget and stopping thresholds for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapePolicy {
    /// Fetch attempts per id, including the first.
    pub attempts: u32,
    /// Wait between attempts on a transient error.
    pub retry_delay: Duration,
    /// Consecutive missing ids that end an unbounded range.
    pub missing_limit: u32,
    /// Consecutive ids whose fetch failed outright before the run is abandoned.
    pub fetch_failure_limit: u32,
}

impl Default for ScrapePolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            missing_limit: DEFAULT_MISSING_LIMIT,
            fetch_failure_limit: DEFAULT_FETCH_FAILURE_LIMIT,
        }
    }
}

/// Options for a scrape run: policy and an optional progress callback `(current id, finish)`.
#[derive(Default)]
pub struct ScrapeOptions<'a> {
    pub policy: ScrapePolicy,
    pub progress: Option<&'a dyn Fn(EntryId, Finish)>,
}

/// Fetch one id, retrying transient errors up to the policy's attempt budget.
/// Returns the last attempt's result.
fn fetch_with_retry(
    fetcher: &mut dyn Fetcher,
    base_url: &Url,
    id: EntryId,
    policy: &ScrapePolicy,
) -> RawFetchResult {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match fetcher.fetch(base_url, id) {
            RawFetchResult::TransientError(cause) if attempt < attempts => {
                log::warn!(
                    "Entry {}: {} (attempt {}/{}). Retrying in {:?}...",
                    id,
                    cause,
                    attempt,
                    attempts,
                    policy.retry_delay
                );
                std::thread::sleep(policy.retry_delay);
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Scrape every id in `range` from `base_url`, in ascending order.
///
/// Bounded ranges stop after the finish id, whatever happened to it. Unbounded ranges stop once
/// `missing_limit` ids in a row were missing or unreadable; those trailing ids add no lines.
/// Either kind stops early with [TerminalReason::FetchFailureAbort] after `fetch_failure_limit`
/// consecutive ids could not be fetched at all.
pub fn scrape(
    fetcher: &mut dyn Fetcher,
    base_url: &Url,
    range: ScrapeRange,
    language: Language,
    options: &ScrapeOptions<'_>,
) -> ScrapeOutcome {
    let policy = &options.policy;
    let missing_limit = policy.missing_limit.max(1);
    let failure_limit = policy.fetch_failure_limit.max(1);

    let mut lines: Vec<FormattedLine> = Vec::new();
    let mut skipped: Vec<Skip> = Vec::new();
    let mut missing_run = 0u32;
    let mut failure_run = 0u32;
    let mut id = range.start();

    let reason = loop {
        if let Some(p) = options.progress {
            p(id, range.finish());
        }

        match fetch_with_retry(fetcher, base_url, id, policy) {
            RawFetchResult::Body(markup) => {
                failure_run = 0;
                match parse_entry(&markup, id, language) {
                    Ok(Some(entry)) => {
                        let text = normalize(&entry.text);
                        let line = FormattedLine::new(entry, text);
                        log::debug!("Found entry {}: {}", id, line);
                        lines.push(line);
                        missing_run = 0;
                    }
                    Ok(None) => {
                        missing_run += 1;
                        log::info!("Entry {} not found ({} in a row).", id, missing_run);
                        skipped.push(Skip {
                            id,
                            cause: SkipCause::NotFound,
                        });
                    }
                    Err(e) => {
                        missing_run += 1;
                        let reason = match e {
                            ScraperError::Parse { reason, .. } => reason,
                            other => other.to_string(),
                        };
                        log::warn!("Entry {}: could not read row: {}. Skipped.", id, reason);
                        skipped.push(Skip {
                            id,
                            cause: SkipCause::ParseFailure(reason),
                        });
                    }
                }
            }
            RawFetchResult::NotFound => {
                failure_run = 0;
                missing_run += 1;
                log::info!("Entry {} not found ({} in a row).", id, missing_run);
                skipped.push(Skip {
                    id,
                    cause: SkipCause::NotFound,
                });
            }
            RawFetchResult::TransientError(cause) => {
                failure_run += 1;
                log::warn!(
                    "Entry {}: failed after {} attempts: {}. Skipped.",
                    id,
                    policy.attempts.max(1),
                    cause
                );
                skipped.push(Skip {
                    id,
                    cause: SkipCause::FetchFailure(cause),
                });
            }
        }

        match range.finish() {
            Finish::Concrete(end) if id >= end => break TerminalReason::RangeExhausted,
            Finish::Concrete(_) => {}
            Finish::Unbounded => {
                if missing_run >= missing_limit {
                    log::info!(
                        "Stopped after {} consecutive missing entries.",
                        missing_run
                    );
                    break TerminalReason::ConsecutiveMissingLimitReached;
                }
            }
        }
        if failure_run >= failure_limit {
            log::error!(
                "Giving up after {} consecutive entries could not be fetched.",
                failure_run
            );
            break TerminalReason::FetchFailureAbort;
        }

        id = match id.checked_add(1) {
            Some(next) => next,
            None => break TerminalReason::RangeExhausted,
        };
    };

    ScrapeOutcome {
        lines,
        skipped,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Always fails; counts calls.
    struct Flaky {
        calls: u32,
    }

    impl Fetcher for Flaky {
        fn fetch(&mut self, _base_url: &Url, _id: EntryId) -> RawFetchResult {
            self.calls += 1;
            RawFetchResult::TransientError("connection reset".to_string())
        }
    }

    /// Fails the first `failures` calls, then serves a one-row table.
    struct RecoversAfter {
        failures: u32,
        calls: u32,
    }

    impl Fetcher for RecoversAfter {
        fn fetch(&mut self, _base_url: &Url, id: EntryId) -> RawFetchResult {
            self.calls += 1;
            if self.calls <= self.failures {
                return RawFetchResult::TransientError("HTTP 503".to_string());
            }
            RawFetchResult::Body(format!(
                "<table><tr><td id=\"{id}\">{id}</td><td></td><td>Line {id}</td><td>行</td></tr></table>"
            ))
        }
    }

    fn base() -> Url {
        Url::parse("https://example.com/game-scripts?fname=t0000&game_id=1").unwrap()
    }

    fn quick_policy() -> ScrapePolicy {
        ScrapePolicy {
            retry_delay: Duration::ZERO,
            ..ScrapePolicy::default()
        }
    }

    #[test]
    fn default_policy_matches_documented_budget() {
        let p = ScrapePolicy::default();
        assert_eq!(p.attempts, 3);
        assert_eq!(p.retry_delay, Duration::from_secs(1));
        assert_eq!(p.missing_limit, 10);
        assert_eq!(p.fetch_failure_limit, 10);
    }

    #[test]
    fn retry_stops_at_attempt_budget() {
        let mut f = Flaky { calls: 0 };
        let result = fetch_with_retry(&mut f, &base(), 1, &quick_policy());
        assert_eq!(f.calls, 3);
        assert_eq!(
            result,
            RawFetchResult::TransientError("connection reset".to_string())
        );
    }

    #[test]
    fn retry_returns_first_success() {
        let mut f = RecoversAfter {
            failures: 2,
            calls: 0,
        };
        let result = fetch_with_retry(&mut f, &base(), 4, &quick_policy());
        assert_eq!(f.calls, 3);
        assert!(matches!(result, RawFetchResult::Body(_)));
    }

    #[test]
    fn zero_attempts_still_fetches_once() {
        let mut f = Flaky { calls: 0 };
        let policy = ScrapePolicy {
            attempts: 0,
            ..quick_policy()
        };
        fetch_with_retry(&mut f, &base(), 1, &policy);
        assert_eq!(f.calls, 1);
    }

    #[test]
    fn fetch_failures_abort_after_limit() {
        let mut f = Flaky { calls: 0 };
        let range = ScrapeRange::new(1, Finish::Unbounded).unwrap();
        let options = ScrapeOptions {
            policy: ScrapePolicy {
                fetch_failure_limit: 2,
                ..quick_policy()
            },
            progress: None,
        };
        let outcome = scrape(&mut f, &base(), range, Language::English, &options);
        assert_eq!(outcome.reason, TerminalReason::FetchFailureAbort);
        assert_eq!(outcome.fetch_failure_count(), 2);
        assert_eq!(f.calls, 6);
    }

    #[test]
    fn progress_reports_every_id() {
        let mut f = RecoversAfter {
            failures: 0,
            calls: 0,
        };
        let seen = Cell::new(0u32);
        let cb = |id: EntryId, finish: Finish| {
            assert_eq!(finish, Finish::Concrete(3));
            seen.set(seen.get() + 1);
            assert_eq!(id, seen.get());
        };
        let options = ScrapeOptions {
            policy: quick_policy(),
            progress: Some(&cb),
        };
        let range = ScrapeRange::new(1, Finish::Concrete(3)).unwrap();
        let outcome = scrape(&mut f, &base(), range, Language::English, &options);
        assert_eq!(seen.get(), 3);
        assert_eq!(outcome.found(), 3);
        assert_eq!(outcome.lines[0].as_str(), r#"1. "Line 1", "#);
    }

    #[test]
    fn unbounded_range_stops_at_max_id() {
        let mut f = RecoversAfter {
            failures: 0,
            calls: 0,
        };
        let range = ScrapeRange::new(u32::MAX - 1, Finish::Unbounded).unwrap();
        let outcome = scrape(
            &mut f,
            &base(),
            range,
            Language::English,
            &ScrapeOptions::default(),
        );
        assert_eq!(outcome.reason, TerminalReason::RangeExhausted);
        assert_eq!(outcome.found(), 2);
    }
}
