//! Typed decoding of structured model output with a bounded repair loop
//!
//! A response is decoded into [`Decoded`]. On a schema error the raw text and
//! the reason are sent back through a repair prompt, up to `max_repairs`
//! times, before the request fails with `MalformedModelOutput`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{LlmProvider, ModelRole};
use crate::types::Note;

use super::prompt::PromptBuilder;

/// Output types the model is asked to produce as JSON
pub trait StructuredOutput: DeserializeOwned {
    /// Format description embedded in prompts
    const FORMAT_INSTRUCTIONS: &'static str;

    /// Semantic checks beyond what deserialization enforces
    fn check(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Result of decoding one response
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// The response matched the schema
    Parsed(T),
    /// The response did not match; keeps the text for the repair prompt
    SchemaError { raw: String, reason: String },
}

/// `{"topics": "a; b; c"}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicsOutput {
    /// Semicolon-separated topics
    pub topics: String,
}

impl TopicsOutput {
    /// Split into at most `limit` trimmed, non-empty topics
    pub fn into_topics(self, limit: usize) -> Vec<String> {
        self.topics
            .split(';')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .take(limit)
            .map(str::to_string)
            .collect()
    }
}

impl StructuredOutput for TopicsOutput {
    const FORMAT_INSTRUCTIONS: &'static str = r#"Return a single JSON object and nothing else:
```json
{"topics": "<topic 1>; <topic 2>; <topic 3>"}
```
"topics" is a string holding at most three topics separated by semicolons."#;
}

impl StructuredOutput for Note {
    const FORMAT_INSTRUCTIONS: &'static str = r#"Return a single JSON object and nothing else:
```json
{"title": "<title of the note>", "note_text": "<the note in Markdown>"}
```
Both fields are strings. Escape newlines inside "note_text" as \n."#;

    fn check(&self) -> std::result::Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("\"title\" is empty".to_string());
        }
        if self.body.trim().is_empty() {
            return Err("\"note_text\" is empty".to_string());
        }
        Ok(())
    }
}

/// Decode a model response into `T`.
///
/// Accepts bare JSON, JSON inside a fenced code block, or a JSON object
/// surrounded by prose.
pub fn decode<T: StructuredOutput>(raw: &str) -> Decoded<T> {
    let mut reason = "no JSON object found in the response".to_string();

    for candidate in json_candidates(raw) {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => {
                return match value.check() {
                    Ok(()) => Decoded::Parsed(value),
                    Err(reason) => Decoded::SchemaError {
                        raw: raw.to_string(),
                        reason,
                    },
                }
            }
            Err(e) => reason = e.to_string(),
        }
    }

    Decoded::SchemaError {
        raw: raw.to_string(),
        reason,
    }
}

// Outermost braces of the whole response first, then of the first fenced block.
fn json_candidates(raw: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    let text = raw.trim();

    if let Some(span) = brace_span(text) {
        candidates.push(span);
    }

    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(span) = after.find("```").and_then(|end| brace_span(&after[..end])) {
            if !candidates.contains(&span) {
                candidates.push(span);
            }
        }
    }

    candidates
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Issues a request and repairs malformed output a bounded number of times
#[derive(Clone)]
pub struct StructuredGenerator {
    provider: Arc<dyn LlmProvider>,
    max_repairs: u32,
}

impl StructuredGenerator {
    /// Create a generator allowing `max_repairs` repair requests per call
    pub fn new(provider: Arc<dyn LlmProvider>, max_repairs: u32) -> Self {
        Self {
            provider,
            max_repairs,
        }
    }

    /// Underlying provider
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Generate with `role` and decode into `T`, repairing on schema errors
    pub async fn generate<T: StructuredOutput>(&self, role: ModelRole, prompt: &str) -> Result<T> {
        let mut raw = self.provider.generate(role, prompt).await?;
        let mut repairs = 0u32;

        loop {
            match decode::<T>(&raw) {
                Decoded::Parsed(value) => {
                    if repairs > 0 {
                        tracing::info!("Model output repaired after {} attempt(s)", repairs);
                    }
                    return Ok(value);
                }
                Decoded::SchemaError { raw: bad, reason } => {
                    if repairs >= self.max_repairs {
                        return Err(Error::malformed(reason, bad));
                    }
                    repairs += 1;
                    tracing::warn!(
                        "Malformed model output ({}), repair attempt {}/{}",
                        reason,
                        repairs,
                        self.max_repairs
                    );
                    let repair_prompt =
                        PromptBuilder::build_repair_prompt(&bad, &reason, T::FORMAT_INSTRUCTIONS);
                    raw = self.provider.generate(ModelRole::Topics, &repair_prompt).await?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bare_and_fenced() {
        let bare = decode::<TopicsOutput>(r#"{"topics": "A; B"}"#);
        assert_eq!(bare, Decoded::Parsed(TopicsOutput { topics: "A; B".into() }));

        let fenced = decode::<TopicsOutput>("Sure!\n```json\n{\"topics\": \"A\"}\n```\nHope it helps.");
        assert_eq!(fenced, Decoded::Parsed(TopicsOutput { topics: "A".into() }));
    }

    #[test]
    fn test_decode_keeps_code_fences_inside_note() {
        let raw = r#"{"title": "Iterators", "note_text": "```rust\nlet v = 1;\n```"}"#;
        match decode::<Note>(raw) {
            Decoded::Parsed(note) => assert!(note.body.starts_with("```rust")),
            other => panic!("expected parsed note, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_embedded_in_prose() {
        let decoded = decode::<Note>(
            "Here is your note: {\"title\": \"Graphs\", \"note_text\": \"# Graphs\\nVertices.\"} Enjoy",
        );
        assert_eq!(decoded, Decoded::Parsed(Note::new("Graphs", "# Graphs\nVertices.")));
    }

    #[test]
    fn test_decode_schema_errors() {
        match decode::<TopicsOutput>("no json here") {
            Decoded::SchemaError { raw, reason } => {
                assert_eq!(raw, "no json here");
                assert!(reason.contains("no JSON object"));
            }
            other => panic!("expected schema error, got {:?}", other),
        }

        assert!(matches!(
            decode::<TopicsOutput>(r#"{"subjects": "A"}"#),
            Decoded::SchemaError { .. }
        ));
        assert!(matches!(
            decode::<Note>(r#"{"title": "  ", "note_text": "body"}"#),
            Decoded::SchemaError { .. }
        ));
    }

    #[test]
    fn test_into_topics_trims_and_limits() {
        let output = TopicsOutput {
            topics: " Graph Theory ;; Euler Paths; Planarity ; Coloring".into(),
        };
        assert_eq!(
            output.into_topics(3),
            vec!["Graph Theory", "Euler Paths", "Planarity"]
        );
    }
}
