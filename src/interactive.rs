//! Interactive front end: asks for each value in turn and re-asks until it validates.

use crate::formats::ExportFormat;
use crate::model::{Language, ScrapeRange};
use crate::request::{
    parse_base_url, parse_finish, parse_format, parse_language, parse_start, RequestError,
    ScrapeRequest,
};
use std::io::{BufRead, Write};

/// Answers used when the user just presses Enter on the language and format prompts.
#[derive(Debug, Clone, Copy)]
pub struct PromptDefaults {
    pub language: Language,
    pub format: ExportFormat,
}

impl Default for PromptDefaults {
    fn default() -> Self {
        Self {
            language: Language::English,
            format: ExportFormat::Both,
        }
    }
}

fn format_token(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Txt => "txt",
        ExportFormat::Html => "html",
        ExportFormat::Both => "both",
    }
}

fn ask<T, R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    default: Option<&str>,
    parse: impl Fn(&str) -> Result<T, RequestError>,
) -> Result<T, RequestError> {
    loop {
        match default {
            Some(d) => write!(output, "{} [{}]: ", label, d)?,
            None => write!(output, "{}: ", label)?,
        }
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(RequestError::InputEnded);
        }
        let answer = match (line.trim(), default) {
            ("", Some(d)) => d,
            (a, _) => a,
        };
        match parse(answer) {
            Ok(value) => return Ok(value),
            Err(e) => writeln!(output, "  {}", e)?,
        }
    }
}

/// Prompt for URL, range, language, and format. End of input aborts with [RequestError::InputEnded].
pub fn prompt_request<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    defaults: PromptDefaults,
) -> Result<ScrapeRequest, RequestError> {
    let base_url = ask(input, output, "Script page URL", None, parse_base_url)?;
    let start = ask(input, output, "Start id", None, parse_start)?;
    let range = ask(
        input,
        output,
        "Finish id (number or 'end')",
        None,
        |s| Ok(ScrapeRange::new(start, parse_finish(s)?)?),
    )?;
    let language = ask(
        input,
        output,
        "Language (en/jp)",
        Some(defaults.language.code()),
        parse_language,
    )?;
    let format = ask(
        input,
        output,
        "Export format (txt/html/both)",
        Some(format_token(defaults.format)),
        parse_format,
    )?;
    Ok(ScrapeRequest {
        base_url,
        range,
        language,
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Finish;
    use std::io::Cursor;

    const URL: &str = "https://trailsinthedatabase.com/game-scripts?fname=t5520&game_id=6";

    fn run(script: &str) -> (Result<ScrapeRequest, RequestError>, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = prompt_request(&mut input, &mut output, PromptDefaults::default());
        (result, String::from_utf8_lossy(&output).into_owned())
    }

    #[test]
    fn accepts_all_values() -> Result<(), RequestError> {
        let (result, _) = run(&format!("{}\n1\n250\njp\ntxt\n", URL));
        let req = result?;
        assert_eq!(req.base_url.as_str(), URL);
        assert_eq!(req.range.start(), 1);
        assert_eq!(req.range.finish(), Finish::Concrete(250));
        assert_eq!(req.language, Language::Japanese);
        assert_eq!(req.format, ExportFormat::Txt);
        Ok(())
    }

    #[test]
    fn blank_answers_take_defaults() -> Result<(), RequestError> {
        let (result, output) = run(&format!("{}\n3\nEND\n\n\n", URL));
        let req = result?;
        assert!(req.range.is_unbounded());
        assert_eq!(req.language, Language::English);
        assert_eq!(req.format, ExportFormat::Both);
        assert!(output.contains("Language (en/jp) [en]: "));
        Ok(())
    }

    #[test]
    fn invalid_answers_are_asked_again() -> Result<(), RequestError> {
        let (result, output) = run(&format!("nope\n{}\n0\n5\n2\n9\nde\nen\npdf\nhtml\n", URL));
        let req = result?;
        assert_eq!(req.range.start(), 5);
        assert_eq!(req.range.finish(), Finish::Concrete(9));
        assert_eq!(req.format, ExportFormat::Html);
        assert!(output.contains("Invalid URL 'nope'"));
        assert!(output.contains("Start number must be at least 1"));
        assert!(output.contains("must be greater than or equal to start number (5)"));
        assert!(output.contains("Invalid language 'de'"));
        assert!(output.contains("Invalid format 'pdf'"));
        Ok(())
    }

    #[test]
    fn end_of_input_aborts() {
        let (result, _) = run(&format!("{}\n1\n", URL));
        assert!(matches!(result, Err(RequestError::InputEnded)));
    }
}
