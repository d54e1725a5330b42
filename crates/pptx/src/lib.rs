//! PPTX (Office Open XML) rendering for validated slide decks.
//!
//! A [`Deck`](deck_core::Deck) is first laid out into slide plans (a title
//! slide followed by one content slide per deck entry), then serialized into
//! a ZIP package of PresentationML parts. [`PptxReader`] reads a package
//! back into slide outlines for inspection.

pub mod export;
pub mod layout;
pub mod reader;
pub mod writer;

pub use export::{with_temp_export, TempExport};
pub use layout::{plan_deck, SlideKind, SlidePlan};
pub use reader::{PptxReader, SlideOutline};
pub use writer::{file_name_for, PptxRenderer, RenderedDeck};

/// PPTX-related constants.
pub mod constants {
    /// EMU per inch.
    pub const EMU_PER_INCH: f64 = 914_400.0;

    /// Widescreen 16:9 slide width in EMU (13.333").
    pub const SLIDE_WIDTH_EMU: i64 = 12_192_000;

    /// Widescreen 16:9 slide height in EMU (7.5").
    pub const SLIDE_HEIGHT_EMU: i64 = 6_858_000;

    /// Notes page width in EMU (portrait 7.5").
    pub const NOTES_WIDTH_EMU: i64 = 6_858_000;

    /// Notes page height in EMU (portrait 10").
    pub const NOTES_HEIGHT_EMU: i64 = 9_144_000;

    /// PresentationML namespace.
    pub const NS_PRESENTATION: &str =
        "http://schemas.openxmlformats.org/presentationml/2006/main";

    /// DrawingML namespace.
    pub const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

    /// Relationships namespace (used for `r:` attributes).
    pub const NS_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    /// Package relationships namespace (used in `.rels` parts).
    pub const NS_PACKAGE_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";

    pub const REL_TYPE_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const REL_TYPE_SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const REL_TYPE_SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const REL_TYPE_NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const REL_TYPE_NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const REL_TYPE_THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

    /// Bullet glyph prefixed to every content line.
    pub const BULLET_GLYPH: char = '\u{2022}';

    /// Typeface used for every text block.
    pub const FONT_FACE: &str = "Arial";
}
