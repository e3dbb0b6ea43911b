use std::error::Error;
use std::fs;

use trailscrape::formats::{fname_from_url, output_stem};
use trailscrape::{export, ExportFormat, Finish, FormattedLine, Language, ParsedEntry};

fn line(id: u32, text: &str, character: &str) -> FormattedLine {
    FormattedLine::new(
        ParsedEntry {
            id,
            number: id.to_string(),
            text: text.to_string(),
            character: character.to_string(),
        },
        text.to_string(),
    )
}

#[test]
fn export_both_writes_text_and_html() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let url = reqwest::Url::parse(
        "https://trailsinthedatabase.com/game-scripts?fname=t5520&game_id=6",
    )?;
    let stem = output_stem(&fname_from_url(&url), 1, Finish::Unbounded, Language::English);
    assert_eq!(stem, "output_t5520_1_end_en");

    let lines = vec![
        line(1, "Hey.", "Rean"),
        line(2, "Fish & <chips>?", "Alisa"),
    ];
    let written = export(&lines, ExportFormat::Both, dir.path(), &stem, Language::English)?;
    assert_eq!(
        written,
        vec![
            dir.path().join("output_t5520_1_end_en.txt"),
            dir.path().join("output_t5520_1_end_en.html"),
        ]
    );

    let text = fs::read_to_string(&written[0])?;
    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec![r#"1. "Hey.", Rean"#, r#"2. "Fish & <chips>?", Alisa"#]
    );

    let html = fs::read_to_string(&written[1])?;
    assert!(html.contains("Trails Database Script"));
    assert!(html.contains("Fish &amp; &lt;chips&gt;?"));
    assert!(!html.contains("<chips>"));
    Ok(())
}

#[test]
fn export_txt_only_writes_one_file() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let stem = output_stem("t0010", 5, Finish::Concrete(9), Language::Japanese);
    let written = export(
        &[line(5, "おい。", "リィン")],
        ExportFormat::Txt,
        dir.path(),
        &stem,
        Language::Japanese,
    )?;
    assert_eq!(written, vec![dir.path().join("output_t0010_5_9_jp.txt")]);
    assert!(!dir.path().join("output_t0010_5_9_jp.html").exists());
    Ok(())
}

#[test]
fn export_into_missing_directory_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("nope");
    let result = export(
        &[line(1, "Hey.", "Rean")],
        ExportFormat::Html,
        &missing,
        "output_x_1_1_en",
        Language::English,
    );
    assert!(result.is_err());
    Ok(())
}
