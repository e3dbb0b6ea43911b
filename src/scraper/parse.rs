//! Entry parser. Finds the table row for one id and reads its four cells:
//! `[0]` id and number, `[1]` character icon, `[2]` English text, `[3]` Japanese text.

use crate::model::{EntryId, Language, ParsedEntry};
use crate::normalize::normalize;
use crate::scraper::error::ScraperError;
use scraper::{ElementRef, Html, Selector};

const CELLS_PER_ROW: usize = 4;

/// Parse a CSS selector or return a parse error (avoids panics from Selector::parse).
fn parse_selector(sel: &str, id: EntryId) -> Result<Selector, ScraperError> {
    Selector::parse(sel).map_err(|e| ScraperError::Parse {
        id,
        reason: format!("invalid selector {:?}: {}", sel, e),
    })
}

fn text_cell_index(language: Language) -> usize {
    match language {
        Language::English => 2,
        Language::Japanese => 3,
    }
}

/// Extract the entry with the given id.
///
/// `Ok(None)` means the id has no row (or the row has no dialogue). `Err` means the page could
/// not be read well enough to tell: no table at all, or a row that does not have the four-cell shape.
pub fn parse_entry(
    markup: &str,
    id: EntryId,
    language: Language,
) -> Result<Option<ParsedEntry>, ScraperError> {
    let fail = |reason: String| ScraperError::Parse { id, reason };
    let doc = Html::parse_document(markup);

    let table_sel = parse_selector("table", id)?;
    if doc.select(&table_sel).next().is_none() {
        return Err(fail("page has no table".to_string()));
    }

    let id_sel = parse_selector(&format!("[id=\"{}\"]", id), id)?;
    let anchor = match doc.select(&id_sel).next() {
        Some(el) => el,
        None => return Ok(None),
    };

    let row = enclosing_row(anchor)
        .ok_or_else(|| fail("element is not inside a table row".to_string()))?;
    let cells: Vec<ElementRef> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == "td")
        .collect();
    if cells.len() < CELLS_PER_ROW {
        return Err(fail(format!(
            "row has {} cells, expected {}",
            cells.len(),
            CELLS_PER_ROW
        )));
    }

    let number = first_number(&cell_text(cells[0]))
        .ok_or_else(|| fail("no entry number in first cell".to_string()))?;

    let text_cell = cells[text_cell_index(language)];
    let (character, text) = match speaker_in_text_cell(text_cell, id)? {
        Some(name_el) => (
            normalize(&name_el.text().collect::<String>()),
            text_without(text_cell, name_el),
        ),
        None => (character_name(row, &cells, id)?, cell_text(text_cell)),
    };
    if text.trim().is_empty() {
        return Ok(None);
    }

    Ok(Some(ParsedEntry {
        id,
        number,
        text,
        character,
    }))
}

fn enclosing_row(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if el.value().name() == "tr" {
        return Some(el);
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "tr")
}

/// Text nodes joined by single spaces, so `<br>`-separated lines do not run together.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<Vec<_>>().join(" ")
}

fn first_number(s: &str) -> Option<String> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    Some(digits)
}

fn is_name_class(class: &str) -> bool {
    let c = class.to_ascii_lowercase();
    c.contains("name") || c.contains("character") || c.contains("chr")
}

/// Name-classed element inside the dialogue cell, when it carries text.
fn speaker_in_text_cell<'a>(
    text_cell: ElementRef<'a>,
    id: EntryId,
) -> Result<Option<ElementRef<'a>>, ScraperError> {
    let classed_sel = parse_selector("[class]", id)?;
    Ok(text_cell.select(&classed_sel).find(|e| {
        e.value().classes().any(is_name_class) && !normalize(&e.text().collect::<String>()).is_empty()
    }))
}

/// Cell text with the text nodes under `skip` left out.
fn text_without(cell: ElementRef<'_>, skip: ElementRef<'_>) -> String {
    cell.descendants()
        .filter(|node| !node.ancestors().any(|a| a.id() == skip.id()))
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Speaker name from outside the dialogue cell, or empty when the row has none.
/// These sources never overlap the dialogue text, so it is left untouched.
fn character_name(
    row: ElementRef<'_>,
    cells: &[ElementRef<'_>],
    id: EntryId,
) -> Result<String, ScraperError> {
    // Icon cell: the image's accessible label.
    let labeled_sel = parse_selector("[alt], [title], [aria-label]", id)?;
    let icon = cells[1];
    let label = std::iter::once(icon)
        .chain(icon.select(&labeled_sel))
        .find_map(|e| {
            ["aria-label", "alt", "title"]
                .iter()
                .filter_map(|attr| e.value().attr(attr))
                .map(normalize)
                .find(|s| !s.is_empty())
        });
    if let Some(name) = label {
        return Ok(name);
    }

    let inline_sel = parse_selector("span, div, strong, b", id)?;
    if let Some(name) = cells[0]
        .select(&inline_sel)
        .map(|e| normalize(&e.text().collect::<String>()))
        .find(|s| !s.is_empty() && !s.chars().all(|c| c.is_ascii_digit()))
    {
        return Ok(name);
    }

    let bold_sel = parse_selector("strong, b", id)?;
    Ok(row
        .select(&bold_sel)
        .map(|e| normalize(&e.text().collect::<String>()))
        .find(|s| !s.is_empty())
        .unwrap_or_default())
}
