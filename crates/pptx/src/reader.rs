//! PPTX reader used to inspect rendered decks.

use crate::constants::{REL_TYPE_NOTES_SLIDE, REL_TYPE_SLIDE};
use deck_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Text found on one slide of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideOutline {
    /// 1-based position in the presentation.
    pub number: usize,

    /// Non-blank paragraphs, top-to-bottom then left-to-right.
    pub paragraphs: Vec<String>,

    /// Presenter notes, if the slide has a notes part.
    pub notes: Option<String>,
}

/// Reader for PPTX (Office Open XML) packages.
pub struct PptxReader;

impl PptxReader {
    pub fn new() -> Self {
        Self
    }

    /// Read every slide of a package, in presentation order.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<SlideOutline>> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_order = self.get_slide_order(&mut archive)?;
        log::debug!("Package lists {} slides", slide_order.len());

        slide_order
            .iter()
            .enumerate()
            .map(|(idx, path)| self.read_slide(&mut archive, path, idx + 1))
            .collect()
    }

    /// Ordered slide part paths from the presentation relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels = read_relationships(archive, "ppt/_rels/presentation.xml.rels")?;

        let mut slides: Vec<(Option<usize>, String)> = rels
            .into_iter()
            .filter(|rel| rel.rel_type == REL_TYPE_SLIDE)
            .map(|rel| (slide_number(&rel.target), resolve_target("ppt", &rel.target)))
            .collect();

        // Numbered parts first, in number order.
        slides.sort_by_key(|(number, path)| (number.is_none(), *number, path.clone()));

        Ok(slides.into_iter().map(|(_, path)| path).collect())
    }

    fn read_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        number: usize,
    ) -> Result<SlideOutline> {
        let content = read_file_from_archive(archive, slide_path)?;

        let mut shapes = extract_shapes(&content);
        shapes.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
        let paragraphs = shapes.into_iter().flat_map(|shape| shape.paragraphs).collect();

        Ok(SlideOutline {
            number,
            paragraphs,
            notes: self.read_notes(archive, slide_path)?,
        })
    }

    /// Notes text linked from a slide's relationships, if any.
    fn read_notes<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Option<String>> {
        let (dir, file) = slide_path.rsplit_once('/').unwrap_or(("", slide_path));
        let rels_path = format!("{}/_rels/{}.rels", dir, file);
        if archive.by_name(&rels_path).is_err() {
            return Ok(None);
        }

        let notes_rel = read_relationships(archive, &rels_path)?
            .into_iter()
            .find(|rel| rel.rel_type == REL_TYPE_NOTES_SLIDE);
        let Some(rel) = notes_rel else {
            return Ok(None);
        };

        let content = read_file_from_archive(archive, &resolve_target(dir, &rel.target))?;
        let text = extract_shapes(&content)
            .into_iter()
            .flat_map(|shape| shape.paragraphs)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

impl Default for PptxReader {
    fn default() -> Self {
        Self::new()
    }
}

/// One `<Relationship>` entry.
#[derive(Debug, Default)]
struct Relationship {
    rel_type: String,
    target: String,
}

fn read_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<Relationship>> {
    let content = read_file_from_archive(archive, path)?;
    let mut reader = Reader::from_str(&content);
    reader.trim_text(true);

    let mut rels = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship::default();
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        _ => {}
                    }
                }
                rels.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships in '{}': {}",
                    path, e
                )));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// A text-bearing shape and its offset.
#[derive(Debug, Default)]
struct ShapeText {
    paragraphs: Vec<String>,
    x: f64,
    y: f64,
}

/// Shapes with at least one non-blank paragraph, in document order.
fn extract_shapes(xml_content: &str) -> Vec<ShapeText> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut current: Option<ShapeText> = None;
    let mut in_paragraph = false;
    let mut paragraph = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => current = Some(ShapeText::default()),
                b"p" if current.is_some() => {
                    in_paragraph = true;
                    paragraph.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) if local_name(e.name().as_ref()) == b"off" => {
                if let Some(ref mut shape) = current {
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value).parse::<f64>();
                        match (attr.key.as_ref(), value) {
                            (b"x", Ok(x)) => shape.x = x,
                            (b"y", Ok(y)) => shape.y = y,
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::Text(ref e)) if in_paragraph => {
                paragraph.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"p" if in_paragraph => {
                    in_paragraph = false;
                    let text = paragraph.trim();
                    if let (Some(shape), false) = (current.as_mut(), text.is_empty()) {
                        shape.paragraphs.push(text.to_string());
                    }
                }
                b"sp" => {
                    if let Some(shape) = current.take() {
                        if !shape.paragraphs.is_empty() {
                            shapes.push(shape);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error (stopping): {}", e);
                break;
            }
            _ => {}
        }
    }

    shapes
}

fn read_file_from_archive<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Number of a slide part target such as `slides/slide3.xml`.
fn slide_number(target: &str) -> Option<usize> {
    let stem = target.strip_suffix(".xml")?;
    let digits_at = stem.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    stem[digits_at..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PptxRenderer;
    use chrono::NaiveDate;
    use deck_core::{Deck, Slide};
    use std::io::Cursor;

    fn rendered(slides: Vec<Slide>) -> Vec<u8> {
        let deck = Deck {
            title: "Quarterly Review".to_string(),
            subtitle: Some("Q3 & Q4".to_string()),
            slides,
        };
        PptxRenderer::new()
            .with_date(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
            .render(&deck)
            .unwrap()
    }

    #[test]
    fn test_slide_number() {
        assert_eq!(slide_number("slides/slide1.xml"), Some(1));
        assert_eq!(slide_number("slides/slide123.xml"), Some(123));
        assert_eq!(slide_number("slides/intro.xml"), None);
        assert_eq!(slide_number("slides/slide2"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("ppt", "slides/slide2.xml"), "ppt/slides/slide2.xml");
        assert_eq!(
            resolve_target("ppt/slides", "../notesSlides/notesSlide2.xml"),
            "ppt/notesSlides/notesSlide2.xml"
        );
        assert_eq!(resolve_target("ppt", "/ppt/slides/slide1.xml"), "ppt/slides/slide1.xml");
    }

    #[test]
    fn test_read_rendered_deck() {
        let bytes = rendered(vec![
            Slide::new("Wins", vec!["Revenue up".to_string(), "Churn down".to_string()]),
            Slide::new("Next", vec!["Hire".to_string()]).with_notes("Mention budget"),
        ]);

        let outlines = PptxReader::new().read(Cursor::new(bytes)).unwrap();
        assert_eq!(outlines.len(), 3);

        assert_eq!(outlines[0].number, 1);
        assert_eq!(
            outlines[0].paragraphs,
            vec!["Quarterly Review", "Q3 & Q4", "October 18, 2026"]
        );
        assert_eq!(outlines[0].notes, None);

        assert_eq!(
            outlines[1].paragraphs,
            vec!["Wins", "\u{2022} Revenue up", "\u{2022} Churn down", "2"]
        );
        assert_eq!(outlines[2].paragraphs, vec!["Next", "\u{2022} Hire", "3"]);
        assert_eq!(outlines[2].notes.as_deref(), Some("Mention budget"));
    }

    #[test]
    fn test_slide_order_beyond_nine() {
        let slides = (1..=11)
            .map(|n| Slide::new(format!("Topic {}", n), vec!["point".to_string()]))
            .collect();

        let outlines = PptxReader::new().read(Cursor::new(rendered(slides))).unwrap();
        let titles: Vec<&str> = outlines[1..].iter().map(|o| o.paragraphs[0].as_str()).collect();
        let expected: Vec<String> = (1..=11).map(|n| format!("Topic {}", n)).collect();
        assert_eq!(titles, expected);
    }

    #[test]
    fn test_not_a_zip() {
        let result = PptxReader::new().read(Cursor::new(b"plain text".to_vec()));
        assert!(matches!(result, Err(Error::ZipError(_))));
    }
}
