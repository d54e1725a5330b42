//! Normalization of raw provider text into deck candidates.
//!
//! Providers do not always honor the requested output format: replies may
//! be wrapped in a code fence, prefixed with commentary, or not JSON at all.
//! Normalization never fails. Anything that cannot be read as a deck turns
//! into a fallback deck that quotes the raw reply, so the user still gets a
//! renderable artifact with diagnostic material in it.
//!
//! Payload extraction is a greedy scan from the first `{` to the last `}`.
//! This is a heuristic: prose that contains unrelated braces, or a reply
//! holding several JSON fragments, makes the scan capture too much and the
//! strict parse then fails into the fallback deck.

use crate::types::DeckDraft;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

/// Opening code fence, optionally tagged `json`.
static FENCE_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[ \t]*(?i:json)?[ \t]*\r?\n?").unwrap());

/// Closing code fence at the very end of the text.
static FENCE_CLOSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n?[ \t]*```$").unwrap());

/// Deck title used for the fallback when the provider produced some text.
pub const FALLBACK_ERROR_TITLE: &str = "Error";

/// Deck title used for the fallback when the provider produced nothing.
pub const FALLBACK_EMPTY_TITLE: &str = "Untitled";

/// Turns raw provider replies into deck candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    /// Create a new normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize a raw reply into a deck candidate.
    ///
    /// The result always has at least one slide. It is not validated.
    pub fn normalize(&self, raw: &str) -> DeckDraft {
        let unfenced = strip_code_fence(raw.trim());

        match extract_json_object(unfenced).and_then(parse_deck_object) {
            Some(value) => {
                log::debug!("Parsed deck payload from provider reply");
                DeckDraft::from_value(value)
            }
            None => {
                log::warn!(
                    "Provider reply is not a deck ({} chars), using fallback",
                    raw.chars().count()
                );
                fallback_deck(raw)
            }
        }
    }
}

/// Remove a leading and/or trailing code fence, keeping the interior.
fn strip_code_fence(text: &str) -> &str {
    let mut text = text;

    if let Some(open) = FENCE_OPEN_REGEX.find(text) {
        text = &text[open.end()..];
    }
    if let Some(close) = FENCE_CLOSE_REGEX.find(text) {
        text = &text[..close.start()];
    }

    text.trim()
}

/// Slice from the first `{` to the last `}`, if both exist in that order.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Strictly parse a JSON object that carries a non-empty `slides` list.
fn parse_deck_object(candidate: &str) -> Option<Value> {
    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Deck payload is not valid JSON: {}", e);
            return None;
        }
    };

    let has_slides = value
        .get("slides")
        .and_then(Value::as_array)
        .is_some_and(|slides| !slides.is_empty());

    (value.is_object() && has_slides).then_some(value)
}

/// Degraded deck quoting the raw reply verbatim.
fn fallback_deck(raw: &str) -> DeckDraft {
    let title = if raw.trim().is_empty() {
        FALLBACK_EMPTY_TITLE
    } else {
        FALLBACK_ERROR_TITLE
    };

    DeckDraft::from_value(json!({
        "title": title,
        "slides": [{ "title": "Error", "content": [raw] }]
    }))
}
