//! Core domain types, AI response normalization, validation and
//! conversation history for slide deck generation.

pub mod conversation;
pub mod error;
pub mod generate;
pub mod normalize;
pub mod prompt;
pub mod provider;
pub mod types;
pub mod validate;

pub use conversation::{Chat, ChatMessage, ChatStore, DirChatStore, MemoryChatStore, Role};
pub use error::{Error, Result};
pub use generate::{DeckGenerator, GenerationRequest};
pub use normalize::ResponseNormalizer;
pub use prompt::{compose_prompt, SYSTEM_PROMPT};
pub use provider::{CommandProvider, StaticProvider, TextProvider};
pub use types::{Deck, DeckDraft, Slide};
pub use validate::{validate, ValidationReport};
