//! Provider reply to PPTX and back.

use chrono::NaiveDate;
use deck_core::{DeckGenerator, GenerationRequest, ResponseNormalizer, StaticProvider};
use deck_pptx::{with_temp_export, PptxReader, PptxRenderer, SlideOutline};
use std::io::Cursor;

fn renderer() -> PptxRenderer {
    PptxRenderer::new().with_date(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
}

fn read_back(bytes: Vec<u8>) -> Vec<SlideOutline> {
    PptxReader::new().read(Cursor::new(bytes)).unwrap()
}

const SIX_SLIDE_REPLY: &str = r#"Here is your deck:
```json
{
  "title": "Q3 Plan!",
  "subtitle": "Engineering",
  "slides": [
    {"title": "Agenda", "content": ["Status", "Risks", "Asks"]},
    {"title": "Status", "content": ["On track", "", "  "]},
    {"title": "Risks", "content": ["Hiring"], "notes": "Ask about the two open roles"},
    {"title": "Asks", "content": []},
    {"title": "Timeline", "content": ["July", "August", "September"]},
    {"title": "Questions", "content": ["Anything else?"]}
  ]
}
```"#;

#[test]
fn test_reply_to_package_in_order() {
    let draft = ResponseNormalizer::new().normalize(SIX_SLIDE_REPLY);
    assert!(draft.validate().is_valid());
    let deck = draft.into_deck().unwrap();

    let rendered = renderer().render_named(&deck).unwrap();
    assert_eq!(rendered.file_name, "Q3_Plan_.pptx");

    let outlines = read_back(rendered.bytes);
    assert_eq!(outlines.len(), 7);

    let titles: Vec<&str> = outlines[1..]
        .iter()
        .map(|o| o.paragraphs[0].as_str())
        .collect();
    assert_eq!(
        titles,
        vec!["Agenda", "Status", "Risks", "Asks", "Timeline", "Questions"]
    );
    assert_eq!(outlines[0].paragraphs[0], "Q3 Plan!");
}

#[test]
fn test_blank_bullets_and_notes() {
    let deck = ResponseNormalizer::new()
        .normalize(SIX_SLIDE_REPLY)
        .into_deck()
        .unwrap();
    let outlines = read_back(renderer().render(&deck).unwrap());

    assert_eq!(outlines[2].paragraphs, vec!["Status", "\u{2022} On track", "3"]);
    assert_eq!(outlines[4].paragraphs, vec!["Asks", "5"]);

    assert_eq!(
        outlines[3].notes.as_deref(),
        Some("Ask about the two open roles")
    );
    assert!(!outlines[3]
        .paragraphs
        .iter()
        .any(|p| p.contains("open roles")));
}

#[test]
fn test_unparseable_reply_still_renders() {
    let provider = StaticProvider::new("Sorry, I can't help with that.");
    let draft = DeckGenerator::new(provider)
        .generate(&GenerationRequest::new("Make a deck"))
        .unwrap();
    let deck = draft.into_deck().unwrap();

    let outlines = read_back(renderer().render(&deck).unwrap());
    assert_eq!(outlines.len(), 2);
    assert_eq!(outlines[0].paragraphs[0], "Error");
    assert_eq!(
        outlines[1].paragraphs,
        vec!["Error", "\u{2022} Sorry, I can't help with that.", "2"]
    );
}

#[test]
fn test_edit_then_export() {
    let deck = ResponseNormalizer::new()
        .normalize(SIX_SLIDE_REPLY)
        .into_deck()
        .unwrap();
    let edited = deck.with_slide_content(3, "Budget\n\nHeadcount\n").unwrap();
    let rendered = renderer().render_named(&edited).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let outline = with_temp_export(dir.path(), &rendered, |export| {
        assert_eq!(export.file_name(), "Q3_Plan_.pptx");
        let bytes = std::fs::read(export.path())?;
        Ok(read_back(bytes))
    })
    .unwrap();

    assert_eq!(
        outline[4].paragraphs,
        vec!["Asks", "\u{2022} Budget", "\u{2022} Headcount", "5"]
    );
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
