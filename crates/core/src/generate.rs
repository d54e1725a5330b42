//! Deck generation: prompt, provider call, normalization.

use crate::error::{Error, Result};
use crate::normalize::ResponseNormalizer;
use crate::prompt::{compose_prompt, SYSTEM_PROMPT};
use crate::provider::TextProvider;
use crate::types::DeckDraft;

/// A user's request for a new deck.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Natural-language description of the deck.
    pub prompt: String,

    /// Text extracted from an uploaded document, if any.
    pub attachment: Option<String>,
}

impl GenerationRequest {
    /// Create a request from a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            attachment: None,
        }
    }

    /// Attach extracted document text.
    pub fn with_attachment(mut self, text: impl Into<String>) -> Self {
        self.attachment = Some(text.into());
        self
    }
}

/// Runs a request through a provider and normalizes the reply.
#[derive(Debug, Clone)]
pub struct DeckGenerator<P> {
    provider: P,
    normalizer: ResponseNormalizer,
}

impl<P: TextProvider> DeckGenerator<P> {
    /// Create a generator using `provider`.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            normalizer: ResponseNormalizer::new(),
        }
    }

    /// Generate a deck candidate.
    ///
    /// Provider failures and blank replies are errors; a reply that is
    /// merely malformed becomes the normalizer's fallback deck. No retries
    /// are attempted here.
    pub fn generate(&self, request: &GenerationRequest) -> Result<DeckDraft> {
        let prompt = compose_prompt(&request.prompt, request.attachment.as_deref())?;
        log::debug!("Requesting deck ({} prompt chars)", prompt.chars().count());

        let reply = self.provider.complete(SYSTEM_PROMPT, &prompt)?;
        if reply.trim().is_empty() {
            return Err(Error::EmptyResponse);
        }

        Ok(self.normalizer.normalize(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticProvider;
    use std::cell::RefCell;

    /// Records the prompt it was given.
    struct RecordingProvider {
        reply: String,
        seen: RefCell<Option<(String, String)>>,
    }

    impl TextProvider for RecordingProvider {
        fn complete(&self, system: &str, prompt: &str) -> Result<String> {
            *self.seen.borrow_mut() = Some((system.to_string(), prompt.to_string()));
            Ok(self.reply.clone())
        }
    }

    struct DownProvider;

    impl TextProvider for DownProvider {
        fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
            Err(Error::ProviderUnavailable("connection refused".to_string()))
        }
    }

    #[test]
    fn test_generate_normalizes_reply() {
        let generator = DeckGenerator::new(StaticProvider::new(
            "```json\n{\"title\":\"Pitch\",\"slides\":[{\"title\":\"Problem\"}]}\n```",
        ));

        let draft = generator.generate(&GenerationRequest::new("Create a pitch deck")).unwrap();
        assert_eq!(draft.title(), Some("Pitch"));
    }

    #[test]
    fn test_generate_sends_system_prompt_and_attachment() {
        let provider = RecordingProvider {
            reply: "{\"title\":\"T\",\"slides\":[{\"title\":\"S\"}]}".to_string(),
            seen: RefCell::new(None),
        };
        let generator = DeckGenerator::new(&provider);

        let request = GenerationRequest::new("Summarize").with_attachment("Notes body");
        generator.generate(&request).unwrap();

        let (system, prompt) = provider.seen.borrow().clone().unwrap();
        assert_eq!(system, SYSTEM_PROMPT);
        assert_eq!(prompt, "Summarize\n\nFile content:\nNotes body");
    }

    #[test]
    fn test_malformed_reply_is_not_an_error() {
        let generator = DeckGenerator::new(StaticProvider::new("I cannot do that."));
        let draft = generator.generate(&GenerationRequest::new("Topic")).unwrap();
        assert_eq!(draft.title(), Some("Error"));
    }

    #[test]
    fn test_blank_reply_is_empty_response() {
        let generator = DeckGenerator::new(StaticProvider::new("  \n"));
        assert!(matches!(
            generator.generate(&GenerationRequest::new("Topic")),
            Err(Error::EmptyResponse)
        ));
    }

    #[test]
    fn test_provider_failure_propagates() {
        let generator = DeckGenerator::new(DownProvider);
        assert!(matches!(
            generator.generate(&GenerationRequest::new("Topic")),
            Err(Error::ProviderUnavailable(_))
        ));
    }

    #[test]
    fn test_blank_prompt_never_reaches_provider() {
        let generator = DeckGenerator::new(DownProvider);
        assert!(matches!(
            generator.generate(&GenerationRequest::new("")),
            Err(Error::EmptyPrompt)
        ));
    }
}
