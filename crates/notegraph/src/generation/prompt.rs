//! Prompt templates for topic extraction, note writing, output repair and translation

/// Prompt builder for the generation requests
pub struct PromptBuilder;

impl PromptBuilder {
    /// Ask for up to three topics covered by `text`
    pub fn build_topics_prompt(text: &str, format_instructions: &str) -> String {
        format!(
            r#"You are an expert at text analysis. Identify the key topics discussed in the text below.

INSTRUCTIONS:
1. Name AT MOST THREE distinct, non-overlapping topics
2. Each topic must be specific to this text; avoid generic names such as "Introduction to machine learning"
3. Keep topic names short but descriptive
4. Always write topic names in English, whatever the language of the text
5. Separate topics with semicolons (;)

OUTPUT FORMAT (used for automatic processing, follow it exactly):
{format_instructions}

TEXT:
{text}"#,
            format_instructions = format_instructions,
            text = text
        )
    }

    /// Ask for a Markdown note about `topic`, linking only to `known_titles`
    pub fn build_note_prompt(
        topic: &str,
        text: &str,
        known_titles: &[String],
        format_instructions: &str,
    ) -> String {
        format!(
            r#"You write notes for an Obsidian knowledge base. Read the text below and write a detailed abstract of everything it says about the topic "{topic}".

INSTRUCTIONS:
1. Focus on the parts of the text relevant to the topic; leave out the rest
2. Use Markdown only: headers, bold, italics, lists
3. Write in English
4. Where a related concept has an existing note, link it with [[Note Title]]. Only link to titles from this list:
{titles}
5. Give the note a short, specific title

OUTPUT FORMAT (used for automatic processing, follow it exactly):
{format_instructions}

TEXT:
{text}"#,
            topic = topic,
            titles = Self::format_titles(known_titles),
            format_instructions = format_instructions,
            text = text
        )
    }

    /// Ask the model to rewrite a malformed answer so it matches the schema
    pub fn build_repair_prompt(raw: &str, reason: &str, format_instructions: &str) -> String {
        format!(
            r#"The answer below was supposed to follow an exact output format but could not be parsed.

PARSE ERROR:
{reason}

EXPECTED FORMAT:
{format_instructions}

ANSWER:
{raw}

Rewrite the answer so it follows the expected format. Keep its content. Reply with the corrected output only."#,
            reason = reason,
            format_instructions = format_instructions,
            raw = raw
        )
    }

    /// Ask for a translation of `text`
    pub fn build_translation_prompt(text: &str, target_language: &str) -> String {
        format!(
            r#"Translate the following text into {target_language}. If it is already in {target_language}, return it unchanged.
Preserve paragraph breaks. Reply with the translation only, without comments.

TEXT:
{text}"#,
            target_language = target_language,
            text = text
        )
    }

    fn format_titles(titles: &[String]) -> String {
        if titles.is_empty() {
            return "(no notes yet)".to_string();
        }
        titles
            .iter()
            .map(|t| format!("- {}", t))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
