//! Slide layout: turns a deck into positioned drawing instructions.
//!
//! Positions are in inches on a 13.333" x 7.5" widescreen slide.

use crate::constants::{BULLET_GLYPH, EMU_PER_INCH};
use chrono::NaiveDate;
use deck_core::{Deck, Error, Result, Slide};

const TITLE_BACKGROUND: &str = "4B5563";
const CONTENT_BACKGROUND: &str = "FFFFFF";
const ACCENT: &str = "4B5563";

/// A rectangle on the slide, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Frame {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Offset and extent in EMU: `(x, y, cx, cy)`.
    pub fn to_emu(&self) -> (i64, i64, i64, i64) {
        let emu = |inches: f64| (inches * EMU_PER_INCH).round() as i64;
        (emu(self.x), emu(self.y), emu(self.w), emu(self.h))
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_ooxml(self) -> &'static str {
        match self {
            Align::Left => "l",
            Align::Center => "ctr",
            Align::Right => "r",
        }
    }
}

/// Vertical anchoring of text inside its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Top,
    Middle,
}

impl Anchor {
    pub fn as_ooxml(self) -> &'static str {
        match self {
            Anchor::Top => "t",
            Anchor::Middle => "ctr",
        }
    }
}

/// Character and paragraph styling for a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub size_pt: u32,
    pub bold: bool,
    /// RGB hex color, e.g. `"1F2937"`.
    pub color: &'static str,
    pub align: Align,
    pub anchor: Anchor,
}

/// A positioned text box. Empty strings in `paragraphs` are blank lines.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub name: &'static str,
    pub frame: Frame,
    pub style: TextStyle,
    pub paragraphs: Vec<String>,
}

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Text(TextBlock),
    Rect {
        name: &'static str,
        frame: Frame,
        fill: &'static str,
    },
}

/// Which kind of slide a plan describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideKind {
    /// The generated opening slide.
    Title,
    /// A deck entry, with its visible page number.
    Content { number: usize },
}

/// Everything needed to draw one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidePlan {
    pub kind: SlideKind,
    /// RGB hex background color.
    pub background: &'static str,
    pub shapes: Vec<Shape>,
    /// Presenter notes, kept out of the visible shapes.
    pub notes: Option<String>,
}

impl SlidePlan {
    /// Non-blank visible paragraphs, in drawing order.
    pub fn visible_text(&self) -> Vec<&str> {
        self.shapes
            .iter()
            .filter_map(|shape| match shape {
                Shape::Text(block) => Some(block),
                Shape::Rect { .. } => None,
            })
            .flat_map(|block| block.paragraphs.iter().map(String::as_str))
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Lay out a deck: one title slide, then one slide per deck entry in order.
///
/// Fails with [`Error::RenderError`] when the deck has no title, no slides,
/// or a slide without a title.
pub fn plan_deck(deck: &Deck, date: NaiveDate) -> Result<Vec<SlidePlan>> {
    if deck.title.trim().is_empty() {
        return Err(Error::RenderError("deck title is missing".to_string()));
    }
    if deck.slides.is_empty() {
        return Err(Error::RenderError("deck has no slides".to_string()));
    }
    if let Some(idx) = deck.slides.iter().position(|s| s.title.trim().is_empty()) {
        return Err(Error::RenderError(format!("slide {} has no title", idx + 1)));
    }

    let mut plans = Vec::with_capacity(deck.slides.len() + 1);
    plans.push(title_slide(deck, date));
    for (idx, slide) in deck.slides.iter().enumerate() {
        // The title slide is page 1.
        plans.push(content_slide(slide, idx + 2));
    }

    Ok(plans)
}

fn lines(text: &str) -> Vec<String> {
    text.lines().map(|line| line.trim().to_string()).collect()
}

fn title_slide(deck: &Deck, date: NaiveDate) -> SlidePlan {
    let mut shapes = vec![Shape::Text(TextBlock {
        name: "Title",
        frame: Frame::new(0.5, 2.0, 12.333, 1.2),
        style: TextStyle {
            size_pt: 48,
            bold: true,
            color: "FFFFFF",
            align: Align::Center,
            anchor: Anchor::Middle,
        },
        paragraphs: lines(&deck.title),
    })];

    if let Some(subtitle) = deck.subtitle.as_deref().filter(|s| !s.trim().is_empty()) {
        shapes.push(Shape::Text(TextBlock {
            name: "Subtitle",
            frame: Frame::new(0.5, 3.5, 12.333, 0.6),
            style: TextStyle {
                size_pt: 24,
                bold: false,
                color: "D1D5DB",
                align: Align::Center,
                anchor: Anchor::Middle,
            },
            paragraphs: lines(subtitle),
        }));
    }

    shapes.push(Shape::Text(TextBlock {
        name: "Footer",
        frame: Frame::new(0.5, 6.8, 12.333, 0.3),
        style: TextStyle {
            size_pt: 14,
            bold: false,
            color: "9CA3AF",
            align: Align::Center,
            anchor: Anchor::Middle,
        },
        paragraphs: vec![date.format("%B %-d, %Y").to_string()],
    }));

    SlidePlan {
        kind: SlideKind::Title,
        background: TITLE_BACKGROUND,
        shapes,
        notes: None,
    }
}

fn content_slide(slide: &Slide, number: usize) -> SlidePlan {
    let mut shapes = vec![
        Shape::Text(TextBlock {
            name: "Slide Number",
            frame: Frame::new(12.333, 7.0, 0.5, 0.3),
            style: TextStyle {
                size_pt: 12,
                bold: false,
                color: "9CA3AF",
                align: Align::Right,
                anchor: Anchor::Middle,
            },
            paragraphs: vec![number.to_string()],
        }),
        Shape::Rect {
            name: "Accent",
            frame: Frame::new(0.5, 0.5, 0.1, 0.8),
            fill: ACCENT,
        },
        Shape::Text(TextBlock {
            name: "Title",
            frame: Frame::new(0.8, 0.5, 12.0, 0.8),
            style: TextStyle {
                size_pt: 32,
                bold: true,
                color: "1F2937",
                align: Align::Left,
                anchor: Anchor::Middle,
            },
            paragraphs: lines(&slide.title),
        }),
    ];

    let mut body = Vec::new();
    for bullet in slide.bullets() {
        if !body.is_empty() {
            body.push(String::new());
        }
        body.push(format!("{} {}", BULLET_GLYPH, bullet));
    }

    if !body.is_empty() {
        shapes.push(Shape::Text(TextBlock {
            name: "Content",
            frame: Frame::new(0.8, 1.8, 11.7, 4.5),
            style: TextStyle {
                size_pt: 18,
                bold: false,
                color: "374151",
                align: Align::Left,
                anchor: Anchor::Top,
            },
            paragraphs: body,
        }));
    }

    SlidePlan {
        kind: SlideKind::Content { number },
        background: CONTENT_BACKGROUND,
        shapes,
        notes: slide
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
    }
}
