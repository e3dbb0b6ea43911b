//! Optional config file loading. Search order: ./trailscrape.toml, then
//! $XDG_CONFIG_HOME/trailscrape/config.toml (or ~/.config/trailscrape/config.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Directory for output files. Paths are relative to CWD.
    pub output_dir: Option<PathBuf>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Fetch attempts per entry, including the first (default 3).
    pub retry_count: Option<u32>,
    /// Seconds to wait between attempts (default 1).
    pub retry_delay_secs: Option<u64>,
    /// Consecutive missing entries that end an open-ended ("end") range (default 10).
    pub missing_limit: Option<u32>,
    /// Consecutive entries that fail to fetch before the run is abandoned (default 10).
    pub fetch_failure_limit: Option<u32>,
    /// Default language when --lang is not given: en or jp.
    pub language: Option<String>,
    /// Default export format when --format is not given: txt, html, or both.
    pub format: Option<String>,
    /// Where entries come from: page (default) or api.
    pub source: Option<String>,
}

fn read_config(path: &Path) -> Result<Config, String> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
    toml::from_str(&s).map_err(|e| format!("Invalid config {}: {}", path.display(), e))
}

/// Search order: (1) ./trailscrape.toml, (2) $XDG_CONFIG_HOME/trailscrape/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("trailscrape.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("trailscrape").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            log::debug!("Using config {}", path.display());
            return read_config(path).map(Some);
        }
    }
    Ok(None)
}
