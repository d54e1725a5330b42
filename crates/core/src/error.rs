//! Error types for deck generation, validation and export.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating, editing or exporting a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A deck or chat record could not be (de)serialized.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The deck failed structural validation.
    #[error("Invalid deck: {}", .0.join("; "))]
    InvalidDeck(Vec<String>),

    /// An edit referenced a slide that does not exist (1-based).
    #[error("Slide {0} does not exist")]
    SlideNotFound(usize),

    /// The user prompt was empty.
    #[error("Prompt is required")]
    EmptyPrompt,

    /// The generation provider could not be reached or failed.
    #[error("Generation service unavailable, please try again: {0}")]
    ProviderUnavailable(String),

    /// The generation provider answered without any content.
    #[error("Generation service returned no content, please try again")]
    EmptyResponse,

    /// The deck handed to the renderer does not meet its preconditions.
    #[error("Cannot render deck: {0}")]
    RenderError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// No chat with this id exists for the caller.
    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    /// A chat record is missing required fields or has an unusable id.
    #[error("Invalid chat: {0}")]
    InvalidChat(String),
}
