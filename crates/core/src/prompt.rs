//! Prompt construction for deck generation.

use crate::error::{Error, Result};

/// Instruction sent to the provider ahead of the user's prompt.
pub const SYSTEM_PROMPT: &str = r#"You are a professional presentation designer. Generate a detailed presentation based on the user's request.

IMPORTANT: You must respond ONLY with valid JSON in this exact format, no markdown, no code blocks, no additional text:

{
  "title": "Presentation Title",
  "subtitle": "Optional subtitle",
  "slides": [
    {
      "title": "Slide Title",
      "content": ["Point 1", "Point 2", "Point 3"],
      "notes": "Optional speaker notes"
    }
  ]
}

Rules:
- Create 5-10 slides
- Each slide should have 3-5 content points
- Content points should be concise and impactful
- Include speaker notes for complex slides
- Response must be pure JSON only"#;

/// Build the user prompt, appending the text of an attached document.
///
/// Fails with [`Error::EmptyPrompt`] when the prompt is blank.
pub fn compose_prompt(prompt: &str, attachment: Option<&str>) -> Result<String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(Error::EmptyPrompt);
    }

    Ok(match attachment.filter(|text| !text.trim().is_empty()) {
        Some(text) => format!("{}\n\nFile content:\n{}", prompt, text),
        None => prompt.to_string(),
    })
}
