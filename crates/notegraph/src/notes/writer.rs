//! Note generation and persistence

use crate::error::Result;
use crate::generation::{PromptBuilder, StructuredGenerator, StructuredOutput};
use crate::providers::ModelRole;
use crate::types::{Note, WriteOutcome};

use super::registry::{persist_new, TitleRegistry};

/// A generated note together with what happened to it
#[derive(Debug, Clone)]
pub struct NoteRecord {
    pub note: Note,
    pub outcome: WriteOutcome,
    /// Wikilink targets that match no known note
    pub dangling_links: Vec<String>,
}

/// Writes one note per topic, deduplicated through the registry
#[derive(Clone)]
pub struct NoteWriter {
    generator: StructuredGenerator,
}

impl NoteWriter {
    pub fn new(generator: StructuredGenerator) -> Self {
        Self { generator }
    }

    /// Generate a note about `topic` from `chunk` and persist it unless a
    /// note with the same title already exists.
    pub async fn write_note(
        &self,
        topic: &str,
        chunk: &str,
        registry: &mut TitleRegistry,
    ) -> Result<WriteOutcome> {
        Ok(self.write_note_record(topic, chunk, registry).await?.outcome)
    }

    /// Like [`write_note`](Self::write_note), also returning the note and its
    /// unresolved links
    pub async fn write_note_record(
        &self,
        topic: &str,
        chunk: &str,
        registry: &mut TitleRegistry,
    ) -> Result<NoteRecord> {
        let known_titles = registry.titles();
        let prompt =
            PromptBuilder::build_note_prompt(topic, chunk, &known_titles, Note::FORMAT_INSTRUCTIONS);
        let note: Note = self.generator.generate(ModelRole::Writing, &prompt).await?;

        let outcome = registry.claim(&note.title, |path| persist_new(path, &note.body))?;

        let dangling_links: Vec<String> = note
            .wikilinks()
            .into_iter()
            .filter(|link| !registry.contains(link))
            .collect();

        match &outcome {
            WriteOutcome::Written { path, .. } => {
                tracing::info!("Wrote note '{}' to {}", note.title, path.display());
            }
            WriteOutcome::Skipped { title } => {
                tracing::info!("Note '{}' already exists, skipping", title);
            }
        }
        if !dangling_links.is_empty() {
            tracing::debug!(
                "Note '{}' links to unknown notes: {}",
                note.title,
                dangling_links.join(", ")
            );
        }

        Ok(NoteRecord {
            note,
            outcome,
            dangling_links,
        })
    }
}
