//! Data model for one scrape run: ids, ranges, parsed entries, formatted lines, and the outcome.
//!
//! Nothing here outlives a run. The range scraper owns the [ScrapeOutcome] until the exporters take it.

use std::fmt;
use thiserror::Error;

/// Positive row id in the script table.
pub type EntryId = u32;

/// Which text column of the table to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Japanese,
}

impl Language {
    /// Short code used on the command line and in output file names.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Japanese => "jp",
        }
    }
}

/// Upper bound of a scrape range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    Concrete(EntryId),
    /// Keep going until the consecutive-missing limit says the script has ended.
    Unbounded,
}

impl fmt::Display for Finish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finish::Concrete(id) => write!(f, "{}", id),
            Finish::Unbounded => f.write_str("end"),
        }
    }
}

/// Validated id range. Construct with [ScrapeRange::new].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeRange {
    start: EntryId,
    finish: Finish,
}

/// Why a range was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Start number must be at least 1")]
    StartBelowOne,

    #[error("Finish number ({finish}) must be greater than or equal to start number ({start})")]
    FinishBeforeStart { start: EntryId, finish: EntryId },
}

impl ScrapeRange {
    pub fn new(start: EntryId, finish: Finish) -> Result<Self, RangeError> {
        if start < 1 {
            return Err(RangeError::StartBelowOne);
        }
        if let Finish::Concrete(end) = finish {
            if end < start {
                return Err(RangeError::FinishBeforeStart { start, finish: end });
            }
        }
        Ok(Self { start, finish })
    }

    pub fn start(&self) -> EntryId {
        self.start
    }

    pub fn finish(&self) -> Finish {
        self.finish
    }

    pub fn is_unbounded(&self) -> bool {
        self.finish == Finish::Unbounded
    }
}

/// One table row as found in the markup, before whitespace normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub id: EntryId,
    pub number: String,
    pub text: String,
    pub character: String,
}

/// Export-ready entry, rendered as `{number}. "{text}", {character}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    id: EntryId,
    number: String,
    text: String,
    character: String,
    line: String,
}

impl FormattedLine {
    /// Build from a parsed entry; `text` must already be normalized.
    pub fn new(entry: ParsedEntry, text: String) -> Self {
        let line = format!("{}. \"{}\", {}", entry.number, text, entry.character);
        Self {
            id: entry.id,
            number: entry.number,
            text,
            character: entry.character,
            line,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn character(&self) -> &str {
        &self.character
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for FormattedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Why an id produced no line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipCause {
    /// No row for the id (or HTTP 404). The normal "missing entry" signal.
    NotFound,
    /// Markup arrived but the row could not be read.
    ParseFailure(String),
    /// Every fetch attempt failed with a transient error.
    FetchFailure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub id: EntryId,
    pub cause: SkipCause,
}

/// How the scrape loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalReason {
    RangeExhausted,
    ConsecutiveMissingLimitReached,
    FetchFailureAbort,
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminalReason::RangeExhausted => "reached the end of the requested range",
            TerminalReason::ConsecutiveMissingLimitReached => {
                "stopped after too many consecutive missing entries"
            }
            TerminalReason::FetchFailureAbort => "aborted after repeated fetch failures",
        };
        f.write_str(s)
    }
}

/// Result of one run of the range scraper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOutcome {
    /// Ascending by id.
    pub lines: Vec<FormattedLine>,
    pub skipped: Vec<Skip>,
    pub reason: TerminalReason,
}

impl ScrapeOutcome {
    pub fn found(&self) -> usize {
        self.lines.len()
    }

    pub fn not_found_count(&self) -> usize {
        self.count_skips(|c| matches!(c, SkipCause::NotFound))
    }

    pub fn parse_failure_count(&self) -> usize {
        self.count_skips(|c| matches!(c, SkipCause::ParseFailure(_)))
    }

    pub fn fetch_failure_count(&self) -> usize {
        self.count_skips(|c| matches!(c, SkipCause::FetchFailure(_)))
    }

    fn count_skips(&self, pred: impl Fn(&SkipCause) -> bool) -> usize {
        self.skipped.iter().filter(|s| pred(&s.cause)).count()
    }

    /// Multi-line end-of-run report: totals per cause and the termination reason.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Found {} entries; skipped {} (not found: {}, unreadable: {}, fetch failed: {}).\nRun {}.",
            self.found(),
            self.skipped.len(),
            self.not_found_count(),
            self.parse_failure_count(),
            self.fetch_failure_count(),
            self.reason
        );
        for skip in &self.skipped {
            match &skip.cause {
                SkipCause::NotFound => {}
                SkipCause::ParseFailure(reason) => {
                    out.push_str(&format!("\n  entry {}: unreadable: {}", skip.id, reason))
                }
                SkipCause::FetchFailure(reason) => {
                    out.push_str(&format!("\n  entry {}: fetch failed: {}", skip.id, reason))
                }
            }
        }
        out
    }
}
