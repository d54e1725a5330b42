//! Structural validation of deck candidates.
//!
//! Every rule is checked and every violation is reported, so callers can
//! surface the full list to the user at once.

use crate::types::DeckDraft;
use serde::Serialize;
use serde_json::Value;

/// Maximum characters in a deck title.
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum characters in a slide title.
pub const MAX_SLIDE_TITLE_CHARS: usize = 150;

/// Maximum number of content slides in a deck.
pub const MAX_SLIDES: usize = 50;

/// Maximum number of bullet points on one slide.
pub const MAX_BULLETS: usize = 10;

/// Outcome of validating a deck candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// True when no rule was violated.
    pub valid: bool,

    /// Human-readable messages, in rule order.
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Whether the candidate passed every rule.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Non-blank text at `key`, if any.
fn present_text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Validate a deck candidate without modifying it.
pub fn validate(draft: &DeckDraft) -> ValidationReport {
    let deck = draft.as_value();
    let mut errors = Vec::new();

    match present_text(deck, "title") {
        None => errors.push("Title is required".to_string()),
        Some(title) if title.chars().count() > MAX_TITLE_CHARS => errors.push(format!(
            "Title is too long (max {} characters)",
            MAX_TITLE_CHARS
        )),
        Some(_) => {}
    }

    let slides = match deck.get("slides").and_then(Value::as_array) {
        Some(slides) => slides,
        None => {
            errors.push("Slides must be a list".to_string());
            return ValidationReport::from_errors(errors);
        }
    };

    if slides.is_empty() {
        errors.push("At least one slide is required".to_string());
    }

    if slides.len() > MAX_SLIDES {
        errors.push(format!("Too many slides (max {})", MAX_SLIDES));
    }

    for (idx, slide) in slides.iter().enumerate() {
        let number = idx + 1;

        match present_text(slide, "title") {
            None => errors.push(format!("Slide {} is missing a title", number)),
            Some(title) if title.chars().count() > MAX_SLIDE_TITLE_CHARS => {
                errors.push(format!(
                    "Slide {} title is too long (max {} characters)",
                    number, MAX_SLIDE_TITLE_CHARS
                ))
            }
            Some(_) => {}
        }

        match slide.get("content") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) if items.len() > MAX_BULLETS => errors.push(format!(
                "Slide {} has too many bullet points (max {})",
                number, MAX_BULLETS
            )),
            Some(Value::Array(_)) => {}
            Some(_) => errors.push(format!("Slide {} content must be a list", number)),
        }
    }

    ValidationReport::from_errors(errors)
}
