//! Domain types for candidate and validated slide decks.

use crate::error::{Error, Result};
use crate::validate::{self, ValidationReport};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A deck candidate that has not been validated yet.
///
/// Provider output is loosely typed until it passes [`validate`], so the
/// draft keeps the raw JSON value. Only a [`Deck`] can be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckDraft(Value);

impl DeckDraft {
    /// Wrap an arbitrary JSON value as a draft.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Parse a draft from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self(serde_json::from_str(text)?))
    }

    /// The underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// The deck title, if it is a string.
    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    /// The slide entries, if `slides` is a list.
    pub fn slides(&self) -> Option<&Vec<Value>> {
        self.0.get("slides").and_then(Value::as_array)
    }

    /// Check this draft against the structural rules.
    pub fn validate(&self) -> ValidationReport {
        validate::validate(self)
    }

    /// Validate and convert into a [`Deck`].
    ///
    /// Fails with [`Error::InvalidDeck`] carrying every validation message.
    pub fn into_deck(self) -> Result<Deck> {
        let report = self.validate();
        if !report.is_valid() {
            return Err(Error::InvalidDeck(report.errors));
        }
        Ok(Deck::from_valid_value(&self.0))
    }
}

/// A validated slide deck.
///
/// Deserializing goes through [`DeckDraft::into_deck`], so stored decks
/// are validated again when they are loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DeckDraft")]
pub struct Deck {
    /// Presentation title.
    pub title: String,

    /// Optional subtitle shown on the title slide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Content slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Build a deck from a value that already passed validation.
    ///
    /// Subtitles and notes that are not text are dropped, as are
    /// non-text bullet entries.
    fn from_valid_value(value: &Value) -> Self {
        let text = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);

        let slides = value
            .get("slides")
            .and_then(Value::as_array)
            .map(|slides| {
                slides
                    .iter()
                    .map(|slide| Slide {
                        title: text(slide, "title").unwrap_or_default(),
                        content: slide
                            .get("content")
                            .and_then(Value::as_array)
                            .map(|items| {
                                items
                                    .iter()
                                    .filter_map(Value::as_str)
                                    .map(str::to_string)
                                    .collect()
                            })
                            .unwrap_or_default(),
                        notes: text(slide, "notes").filter(|n| !n.trim().is_empty()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title: text(value, "title").unwrap_or_default(),
            subtitle: text(value, "subtitle").filter(|s| !s.trim().is_empty()),
            slides,
        }
    }

    /// Convert back into a draft, e.g. to re-validate after an edit.
    pub fn to_draft(&self) -> DeckDraft {
        let slides: Vec<Value> = self
            .slides
            .iter()
            .map(|slide| {
                let mut entry = json!({
                    "title": slide.title,
                    "content": slide.content,
                });
                if let Some(notes) = &slide.notes {
                    entry["notes"] = json!(notes);
                }
                entry
            })
            .collect();

        let mut value = json!({ "title": self.title, "slides": slides });
        if let Some(subtitle) = &self.subtitle {
            value["subtitle"] = json!(subtitle);
        }
        DeckDraft(value)
    }

    /// Return a new deck whose slide at `index` (0-based) has its bullets
    /// replaced by the non-blank lines of `text`.
    ///
    /// The edited deck is validated again before it is returned.
    pub fn with_slide_content(&self, index: usize, text: &str) -> Result<Deck> {
        if index >= self.slides.len() {
            return Err(Error::SlideNotFound(index + 1));
        }

        let mut edited = self.clone();
        edited.slides[index].content = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        log::debug!(
            "Edited slide {} to {} bullets",
            index + 1,
            edited.slides[index].content.len()
        );

        edited.to_draft().into_deck()
    }
}

impl TryFrom<DeckDraft> for Deck {
    type Error = Error;

    fn try_from(draft: DeckDraft) -> Result<Self> {
        draft.into_deck()
    }
}

/// One content slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// Slide heading.
    pub title: String,

    /// Bullet points in order.
    #[serde(default)]
    pub content: Vec<String>,

    /// Optional presenter notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Slide {
    /// Create a slide with a title and bullets.
    pub fn new(title: impl Into<String>, content: Vec<String>) -> Self {
        Self {
            title: title.into(),
            content,
            notes: None,
        }
    }

    /// Attach presenter notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Trimmed, non-empty bullets in order.
    pub fn bullets(&self) -> Vec<&str> {
        self.content
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .collect()
    }
}
