//! CLI parsing and orchestration. Builds a request from arguments or prompts, runs the scrape,
//! writes TXT/HTML, and maps errors to exit codes.

use crate::config::{self, Config};
use crate::formats::{export, fname_from_url, output_stem, ExportFormat, FormatError};
use crate::interactive::{prompt_request, PromptDefaults};
use crate::model::{EntryId, Finish, Language};
use crate::request::{parse_format, parse_language, RequestError, ScrapeRequest};
use crate::scraper::{
    scrape, ApiFetcher, Fetcher, HttpFetcher, ScrapeOptions, ScrapePolicy, ScraperError, Source,
};
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Request(#[from] RequestError),

    #[error("{0}")]
    Scraper(#[from] ScraperError),

    #[error("{0}")]
    Format(#[from] FormatError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) | CliRunError::Request(_) => 1,
            CliRunError::Scraper(_) => 2,
            CliRunError::Format(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "trailscrape")]
#[command(about = "Scrape game script dialogue from trailsinthedatabase.com into TXT and HTML")]
#[command(allow_negative_numbers = true)]
#[command(
    after_help = "Run without arguments to be prompted for each value.\n\nExamples:\n  trailscrape \"https://trailsinthedatabase.com/game-scripts?fname=t5520&game_id=6\" 1 250 --lang en --format txt\n  trailscrape \"https://trailsinthedatabase.com/game-scripts?fname=t5520&game_id=6\" 200 end --lang jp --format html\n\nConfig file keys (output_dir, user_agent, timeout_secs, retry_count, retry_delay_secs, missing_limit, fetch_failure_limit, language, format, source) are read from ./trailscrape.toml or the user config directory. CLI flags override config."
)]
pub struct Args {
    /// Script page URL (any #anchor is ignored). Omit to be prompted.
    pub url: Option<String>,

    /// First entry id (1 or more).
    pub start: Option<String>,

    /// Last entry id, or "end"/"END" to continue until entries run out.
    pub finish: Option<String>,

    /// Language: en for English, jp for Japanese (default: en).
    #[arg(long, value_parser = parse_language)]
    pub lang: Option<Language>,

    /// Export format: txt, html, or both (default: both).
    #[arg(long, value_parser = parse_format)]
    pub format: Option<ExportFormat>,

    /// Entry source: page (default) or api (TrailsDB script API; needs fname and game_id in the URL).
    #[arg(long, value_parser = parse_source)]
    pub source: Option<Source>,

    /// Directory for output files (default: current directory).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds (overrides config; default 10).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Suppress progress and summary output (errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Log every entry and print the error chain on failure.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_source(s: &str) -> Result<Source, String> {
    match s.trim().to_lowercase().as_str() {
        "page" => Ok(Source::Page),
        "api" => Ok(Source::Api),
        _ => Err(format!(
            "Invalid --source value: '{}'. Use page or api.",
            s
        )),
    }
}

/// Everything besides the request that shapes a run. Resolved from flags, then config, then defaults.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub source: Source,
    pub policy: ScrapePolicy,
    pub output_dir: PathBuf,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
    pub quiet: bool,
}

fn policy_from_config(config: Option<&Config>) -> ScrapePolicy {
    let defaults = ScrapePolicy::default();
    let Some(c) = config else {
        return defaults;
    };
    ScrapePolicy {
        attempts: c.retry_count.unwrap_or(defaults.attempts).max(1),
        retry_delay: c
            .retry_delay_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.retry_delay),
        missing_limit: c.missing_limit.unwrap_or(defaults.missing_limit).max(1),
        fetch_failure_limit: c
            .fetch_failure_limit
            .unwrap_or(defaults.fetch_failure_limit)
            .max(1),
    }
}

/// Resolve a flag, falling back to a config string parsed with the same rules.
fn flag_or_config<T, E: std::fmt::Display>(
    flag: Option<T>,
    config_value: Option<&str>,
    key: &str,
    parse: impl Fn(&str) -> Result<T, E>,
    default: T,
) -> Result<T, CliRunError> {
    if let Some(v) = flag {
        return Ok(v);
    }
    match config_value {
        Some(s) => parse(s)
            .map_err(|e| CliRunError::InvalidInput(format!("Invalid config value for {}: {}", key, e))),
        None => Ok(default),
    }
}

/// Build the request from positional arguments.
fn request_from_args(
    args: &Args,
    url: &str,
    language: Language,
    format: ExportFormat,
) -> Result<ScrapeRequest, CliRunError> {
    let (start, finish) = match (&args.start, &args.finish) {
        (Some(s), Some(f)) => (s, f),
        _ => {
            return Err(CliRunError::InvalidInput(
                "START and FINISH are required when URL is given (FINISH may be 'end').".to_string(),
            ))
        }
    };
    Ok(ScrapeRequest::new(url, start, finish, language, format)?)
}

fn make_fetcher(
    request: &ScrapeRequest,
    settings: &RunSettings,
) -> Result<Box<dyn Fetcher>, CliRunError> {
    match settings.source {
        Source::Page => {
            let mut builder = HttpFetcher::builder();
            if let Some(ref ua) = settings.user_agent {
                builder = builder.user_agent(ua.clone());
            }
            if let Some(secs) = settings.timeout_secs {
                builder = builder.timeout_secs(secs);
            }
            Ok(Box::new(builder.build()?))
        }
        Source::Api => {
            let fetcher = ApiFetcher::new(
                &request.base_url,
                settings.user_agent.clone(),
                settings.timeout_secs,
            )
            .map_err(|e| match e {
                ScraperError::InvalidUrl { input, reason } => CliRunError::InvalidInput(format!(
                    "The API source needs a game-scripts URL with fname and game_id, e.g. https://trailsinthedatabase.com/game-scripts?fname=t5520&game_id=6. Invalid: {}: {}",
                    input, reason
                )),
                other => CliRunError::Scraper(other),
            })?;
            log::debug!("Using script API at {}", fetcher.endpoint());
            Ok(Box::new(fetcher))
        }
    }
}

fn new_progress_bar(start: EntryId, finish: Finish) -> indicatif::ProgressBar {
    let bar = match finish {
        Finish::Concrete(end) => {
            let bar = indicatif::ProgressBar::new(u64::from(end - start) + 1);
            if let Ok(style) = indicatif::ProgressStyle::with_template(
                "{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})",
            ) {
                bar.set_style(
                    style
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                        .progress_chars("█▉▊▋▌▍▎▏ "),
                );
            }
            bar
        }
        Finish::Unbounded => {
            let bar = indicatif::ProgressBar::new_spinner();
            if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner} {msg} ({elapsed})")
            {
                bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
            }
            bar
        }
    };
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Scrape one validated request and write its output files. Both front ends end up here.
pub fn run_request(request: &ScrapeRequest, settings: &RunSettings) -> Result<(), CliRunError> {
    let mut fetcher = make_fetcher(request, settings)?;
    let start = request.range.start();

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |id: EntryId, finish: Finish| {
        let mut state = progress_state.borrow_mut();
        let pb = state.get_or_insert_with(|| new_progress_bar(start, finish));
        if let Finish::Concrete(_) = finish {
            pb.set_position(u64::from(id - start));
        }
        pb.set_message(format!("Fetching entry {}", id));
    };
    let progress: Option<&dyn Fn(EntryId, Finish)> = if settings.quiet {
        None
    } else {
        Some(&progress_cb)
    };

    let options = ScrapeOptions {
        policy: settings.policy.clone(),
        progress,
    };
    let outcome = scrape(
        &mut *fetcher,
        &request.base_url,
        request.range,
        request.language,
        &options,
    );

    if let Some(pb) = progress_state.borrow_mut().take() {
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }

    if !settings.quiet {
        eprintln!("{}", outcome.summary());
    }

    if outcome.lines.is_empty() {
        log::warn!("No entries found. Nothing written.");
        return Ok(());
    }

    let stem = output_stem(
        &fname_from_url(&request.base_url),
        start,
        request.range.finish(),
        request.language,
    );
    let written = export(
        &outcome.lines,
        request.format,
        &settings.output_dir,
        &stem,
        request.language,
    )?;
    if !settings.quiet {
        for path in &written {
            eprintln!("Exported {} entries to {}", outcome.found(), path.display());
        }
    }
    Ok(())
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;
    let cfg = config.as_ref();

    let language = flag_or_config(
        args.lang,
        cfg.and_then(|c| c.language.as_deref()),
        "language",
        parse_language,
        Language::English,
    )?;
    let format = flag_or_config(
        args.format,
        cfg.and_then(|c| c.format.as_deref()),
        "format",
        parse_format,
        ExportFormat::Both,
    )?;
    let source = flag_or_config(
        args.source,
        cfg.and_then(|c| c.source.as_deref()),
        "source",
        parse_source,
        Source::Page,
    )?;

    let settings = RunSettings {
        source,
        policy: policy_from_config(cfg),
        output_dir: args
            .output_dir
            .clone()
            .or_else(|| cfg.and_then(|c| c.output_dir.clone()))
            .unwrap_or_else(|| PathBuf::from(".")),
        user_agent: args
            .user_agent
            .clone()
            .or_else(|| cfg.and_then(|c| c.user_agent.clone())),
        timeout_secs: args.timeout.or_else(|| cfg.and_then(|c| c.timeout_secs)),
        quiet: args.quiet,
    };

    let request = match args.url.as_deref() {
        Some(url) => request_from_args(args, url, language, format)?,
        None => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            prompt_request(
                &mut stdin.lock(),
                &mut stdout.lock(),
                PromptDefaults { language, format },
            )?
        }
    };

    if !settings.quiet {
        eprintln!("{}", run_banner(&request, &settings.policy));
    }
    run_request(&request, &settings)
}

fn run_banner(request: &ScrapeRequest, policy: &ScrapePolicy) -> String {
    let mut banner = format!(
        "Scraping entries {} to {} ({}) from {}",
        request.range.start(),
        request.range.finish(),
        request.language.code(),
        request.base_url
    );
    if request.range.is_unbounded() {
        banner.push_str(&format!(
            "; stopping after {} missing entries in a row",
            policy.missing_limit.max(1)
        ));
    }
    banner
}
