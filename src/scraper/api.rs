//! TrailsDB script API source: `GET {host}/api/script/detail/{game_id}/{fname}`.
//!
//! The API returns the whole script as a JSON array. [ApiFetcher] downloads it once per run and
//! renders each requested row into the same four-cell table row the page uses, so the parser and
//! the scrape loop do not care which source produced the markup.

use crate::formats::html_escape;
use crate::model::EntryId;
use crate::scraper::client::{build_http_client, DEFAULT_TIMEOUT_SECS};
use crate::scraper::error::ScraperError;
use crate::scraper::{Fetcher, RawFetchResult};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;

/// One script row as returned by the API. Fields the scraper does not use are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRow {
    pub row: EntryId,
    #[serde(default)]
    pub eng_chr_name: Option<String>,
    #[serde(default)]
    pub eng_html_text: Option<String>,
    #[serde(default)]
    pub jpn_chr_name: Option<String>,
    #[serde(default)]
    pub jpn_html_text: Option<String>,
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}

/// Script detail endpoint for a game-scripts page URL (needs `fname` and numeric `game_id` in the query).
pub fn api_url(base_url: &Url) -> Result<Url, ScraperError> {
    let invalid = |reason: &str| ScraperError::InvalidUrl {
        input: base_url.to_string(),
        reason: reason.to_string(),
    };
    let fname = query_value(base_url, "fname").ok_or_else(|| invalid("missing fname parameter"))?;
    let game_id: u32 = query_value(base_url, "game_id")
        .ok_or_else(|| invalid("missing game_id parameter"))?
        .parse()
        .map_err(|_| invalid("game_id is not a number"))?;
    let game_id = game_id.to_string();
    let mut url = base_url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot have a path"))?
        .clear()
        .extend(["api", "script", "detail", game_id.as_str(), fname.as_str()]);
    Ok(url)
}

/// Render one API row as a script table. Speaker names go in a `chr-name` span at the start
/// of each text cell, where the parser looks first.
pub(crate) fn render_row(row: &ScriptRow) -> String {
    fn text_cell(name: Option<&str>, html: Option<&str>) -> String {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .map(|n| format!("<span class=\"chr-name\">{}</span> ", html_escape(n)))
            .unwrap_or_default();
        format!("<td>{}{}</td>", name, html.unwrap_or_default())
    }
    format!(
        "<table><tbody><tr><td><a id=\"{id}\">{id}</a></td><td></td>{en}{jp}</tr></tbody></table>",
        id = row.row,
        en = text_cell(row.eng_chr_name.as_deref(), row.eng_html_text.as_deref()),
        jp = text_cell(row.jpn_chr_name.as_deref(), row.jpn_html_text.as_deref()),
    )
}

/// Fetcher backed by the script API. The endpoint is fixed at construction; the `base_url`
/// passed to [Fetcher::fetch] is not consulted.
#[derive(Debug)]
pub struct ApiFetcher {
    client: reqwest::blocking::Client,
    url: Url,
    rows: Option<HashMap<EntryId, ScriptRow>>,
}

impl ApiFetcher {
    /// Resolve the endpoint for `base_url` and build the client. Fails if the page URL lacks `fname` or `game_id`.
    pub fn new(
        base_url: &Url,
        user_agent: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, ScraperError> {
        let url = api_url(base_url)?;
        let client = build_http_client(
            user_agent,
            timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1),
        )?;
        Ok(Self {
            client,
            url,
            rows: None,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.url
    }

    fn load(&self) -> Result<HashMap<EntryId, ScriptRow>, ScraperError> {
        let url = self.url.to_string();
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .map_err(|e| ScraperError::Network {
                url: url.clone(),
                source: e,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }
        let body = response.text().map_err(|e| ScraperError::BodyRead {
            url: url.clone(),
            source: e,
        })?;
        let rows: Vec<ScriptRow> =
            serde_json::from_str(&body).map_err(|e| ScraperError::ApiResponse {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        log::info!("Loaded {} script rows from {}", rows.len(), url);
        let mut by_id = HashMap::with_capacity(rows.len());
        for row in rows {
            by_id.entry(row.row).or_insert(row);
        }
        Ok(by_id)
    }
}

impl Fetcher for ApiFetcher {
    fn fetch(&mut self, _base_url: &Url, id: EntryId) -> RawFetchResult {
        if self.rows.is_none() {
            match self.load() {
                Ok(rows) => self.rows = Some(rows),
                Err(e) => return RawFetchResult::TransientError(e.to_string()),
            }
        }
        match self.rows.as_ref().and_then(|rows| rows.get(&id)) {
            Some(row) => RawFetchResult::Body(render_row(row)),
            None => RawFetchResult::NotFound,
        }
    }
}
