//! Output files: plain text (one formatted line per entry) and a styled standalone HTML page.
//! Both consume the ordered lines of a finished scrape.

use crate::model::{EntryId, Finish, FormattedLine, Language};
use reqwest::Url;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Export format selector for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Html,
    Both,
}

impl ExportFormat {
    pub fn writes_text(self) -> bool {
        matches!(self, ExportFormat::Txt | ExportFormat::Both)
    }

    pub fn writes_html(self) -> bool {
        matches!(self, ExportFormat::Html | ExportFormat::Both)
    }
}

/// Errors from the format writers.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Cannot write output: {path}: parent directory does not exist.")]
    MissingDirectory { path: PathBuf },

    #[error("Failed to write output: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Value of the `fname` query parameter, or `output` when absent.
pub fn fname_from_url(url: &Url) -> String {
    url.query_pairs()
        .find(|(k, _)| k == "fname")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "output".to_string())
}

/// File name stem: `output_{fname}_{start}_{finish}_{lang}`, finish being a number or `end`.
pub fn output_stem(fname: &str, start: EntryId, finish: Finish, language: Language) -> String {
    let fname: String = fname
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("output_{}_{}_{}_{}", fname, start, finish, language.code())
}

fn create(path: &Path) -> Result<BufWriter<File>, FormatError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(FormatError::MissingDirectory {
                path: path.to_path_buf(),
            });
        }
    }
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| FormatError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> FormatError + '_ {
    move |e| FormatError::Io {
        path: path.to_path_buf(),
        source: e,
    }
}

/// Write each line on its own line.
pub fn write_text(lines: &[FormattedLine], path: &Path) -> Result<(), FormatError> {
    let mut f = create(path)?;
    let mut write = || -> std::io::Result<()> {
        for line in lines {
            writeln!(f, "{}", line)?;
        }
        f.flush()
    };
    write().map_err(io_err(path))
}

const HTML_STYLE: &str = r#"    <style>
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            line-height: 1.6;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
            background-color: #f5f5f5;
        }
        .container {
            background-color: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        h1 {
            color: #333;
            border-bottom: 3px solid #4CAF50;
            padding-bottom: 10px;
        }
        .entry {
            margin: 15px 0;
            padding: 15px;
            background-color: #fafafa;
            border-left: 4px solid #4CAF50;
            border-radius: 4px;
        }
        .entry-number { font-weight: bold; color: #666; font-size: 0.9em; }
        .entry-text { margin: 8px 0; color: #333; font-size: 1.05em; }
        .entry-character { font-style: italic; color: #888; margin-top: 5px; }
    </style>"#;

/// Write a standalone HTML page with one styled block per entry.
pub fn write_html(
    lines: &[FormattedLine],
    path: &Path,
    title: &str,
    language: Language,
) -> Result<(), FormatError> {
    let mut f = create(path)?;
    let title_esc = html_escape(title);
    let mut write = || -> std::io::Result<()> {
        writeln!(f, r#"<!DOCTYPE html>"#)?;
        writeln!(f, r#"<html lang="{}">"#, html_lang(language))?;
        writeln!(f, r#"<head>"#)?;
        writeln!(f, r#"    <meta charset="UTF-8">"#)?;
        writeln!(
            f,
            r#"    <meta name="viewport" content="width=device-width, initial-scale=1.0">"#
        )?;
        writeln!(f, r#"    <title>{}</title>"#, title_esc)?;
        writeln!(f, "{}", HTML_STYLE)?;
        writeln!(f, r#"</head>"#)?;
        writeln!(f, r#"<body>"#)?;
        writeln!(f, r#"    <div class="container">"#)?;
        writeln!(f, r#"        <h1>{}</h1>"#, title_esc)?;
        for line in lines {
            writeln!(f, r#"        <div class="entry" id="entry-{}">"#, line.id())?;
            writeln!(
                f,
                r#"            <div class="entry-number">Entry {}</div>"#,
                html_escape(line.number())
            )?;
            writeln!(
                f,
                r#"            <div class="entry-text">&quot;{}&quot;</div>"#,
                html_escape(line.text())
            )?;
            writeln!(
                f,
                r#"            <div class="entry-character">{}</div>"#,
                html_escape(line.character())
            )?;
            writeln!(f, r#"        </div>"#)?;
        }
        writeln!(f, r#"    </div>"#)?;
        writeln!(f, r#"</body>"#)?;
        writeln!(f, r#"</html>"#)?;
        f.flush()
    };
    write().map_err(io_err(path))
}

fn html_lang(language: Language) -> &'static str {
    match language {
        Language::English => "en",
        Language::Japanese => "ja",
    }
}

/// Write the requested formats into `dir` and return the paths written, text first.
pub fn export(
    lines: &[FormattedLine],
    format: ExportFormat,
    dir: &Path,
    stem: &str,
    language: Language,
) -> Result<Vec<PathBuf>, FormatError> {
    let mut written = Vec::new();
    if format.writes_text() {
        let path = dir.join(format!("{}.txt", stem));
        write_text(lines, &path)?;
        written.push(path);
    }
    if format.writes_html() {
        let path = dir.join(format!("{}.html", stem));
        write_html(lines, &path, "Trails Database Script", language)?;
        written.push(path);
    }
    Ok(written)
}
