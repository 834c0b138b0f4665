//! Document pipeline: extract, translate, chunk, extract topics, write notes

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::NotesConfig;
use crate::error::{Error, Result};
use crate::generation::{LlmTranslator, PassthroughTranslator, StructuredGenerator, Translator};
use crate::ingestion::{scan_input_dir, ExternalParser, FileParser, ParsedDocument, TextChunker};
use crate::notes::{NoteWriter, TitleRegistry, TopicExtractor};
use crate::providers::LlmProvider;
use crate::types::{Document, FileType, WriteOutcome};

/// Where the pipeline currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// Between documents
    Idle,
    /// Asking for the topics of a chunk
    Extracting { chunk: usize },
    /// Writing the note for one topic of a chunk
    GeneratingNotes { chunk: usize, topic: String },
    /// The last document could not be extracted or translated
    Aborted,
    /// Every document has been handled
    Done,
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Documents that went through chunking
    pub documents_processed: usize,
    /// Documents given up on during extraction or translation
    pub documents_aborted: usize,
    /// Documents whose text matched an earlier document in the same run
    pub documents_duplicate: usize,
    pub chunks: usize,
    /// Chunks whose topics could not be extracted
    pub chunk_failures: usize,
    pub topics: usize,
    pub notes_written: usize,
    pub notes_skipped: usize,
    /// Topics whose note could not be generated
    pub note_failures: usize,
    /// Wikilinks pointing at notes that do not exist
    pub dangling_links: usize,
}

/// Sequential note pipeline.
///
/// Documents, chunks and topics are handled one at a time. The title
/// registry lives here and is lent to the note writer for each topic.
pub struct Pipeline {
    config: NotesConfig,
    translator: Arc<dyn Translator>,
    external_parser: ExternalParser,
    topics: TopicExtractor,
    writer: NoteWriter,
    registry: TitleRegistry,
    state: PipelineState,
    seen_hashes: HashSet<String>,
}

impl Pipeline {
    /// Build a pipeline whose translator follows `config.translation`
    pub fn new(config: NotesConfig, provider: Arc<dyn LlmProvider>) -> Result<Self> {
        let translator: Arc<dyn Translator> = if config.translation.enabled {
            Arc::new(LlmTranslator::new(
                provider.clone(),
                config.translation.group_size,
                config.translation.target_language.clone(),
            ))
        } else {
            Arc::new(PassthroughTranslator)
        };
        Self::with_translator(config, provider, translator)
    }

    /// Build a pipeline with an explicit translator
    pub fn with_translator(
        config: NotesConfig,
        provider: Arc<dyn LlmProvider>,
        translator: Arc<dyn Translator>,
    ) -> Result<Self> {
        let registry = TitleRegistry::seed(&config.paths.output_dir)?;
        let external_parser = ExternalParser::new(config.ingestion.external_parser.clone())?;
        let generator = StructuredGenerator::new(provider, config.llm.max_repair_attempts);

        Ok(Self {
            translator,
            external_parser,
            topics: TopicExtractor::new(generator.clone()),
            writer: NoteWriter::new(generator),
            registry,
            state: PipelineState::Idle,
            seen_hashes: HashSet::new(),
            config,
        })
    }

    pub fn registry(&self) -> &TitleRegistry {
        &self.registry
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Process every document in the input directory
    pub async fn run(&mut self) -> Result<RunSummary> {
        self.run_with_progress(|_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_document(path, total)` after each
    /// document
    pub async fn run_with_progress<F>(&mut self, mut on_document: F) -> Result<RunSummary>
    where
        F: FnMut(&Path, usize),
    {
        let files = scan_input_dir(&self.config.paths.input_dir, &self.config.ingestion.extensions)?;
        tracing::info!(
            "Found {} document(s) in {}",
            files.len(),
            self.config.paths.input_dir.display()
        );

        let started = Instant::now();
        let mut summary = RunSummary::default();
        for path in &files {
            self.process_document(path, &mut summary).await?;
            on_document(path, files.len());
        }
        self.state = PipelineState::Done;

        tracing::info!(
            "Run finished in {:.1}s: {} document(s), {} aborted, {} chunk(s), {} note(s) written, {} skipped, {} failed",
            started.elapsed().as_secs_f64(),
            summary.documents_processed,
            summary.documents_aborted,
            summary.chunks,
            summary.notes_written,
            summary.notes_skipped,
            summary.chunk_failures + summary.note_failures
        );
        Ok(summary)
    }

    /// Process one document.
    ///
    /// Extraction and translation failures abort only this document, and
    /// failed chunks or topics are skipped. Anything else ends the run.
    pub async fn process_document(&mut self, path: &Path, summary: &mut RunSummary) -> Result<()> {
        let name = display_name(path);
        tracing::info!("[{}] Processing document", name);

        let extracted = self.extract(path).await;
        let mut document = match extracted {
            Ok(document) => document,
            Err(e) => return self.abort_document(path, e, summary),
        };

        if !self.seen_hashes.insert(document.content_hash.clone()) {
            tracing::info!(
                "[{}] Same text as an earlier document (hash: {}...), skipping",
                name,
                &document.content_hash[..12.min(document.content_hash.len())]
            );
            summary.documents_duplicate += 1;
            self.state = PipelineState::Idle;
            return Ok(());
        }

        let translated = self.translator.translate(&document.text).await;
        match translated {
            Ok(translated) => {
                if translated != document.text {
                    tracing::info!("[{}] Translated to {} chars", name, translated.chars().count());
                }
                document.translated = Some(translated);
            }
            Err(e) => return self.abort_document(path, e, summary),
        }

        let text = document.working_text();
        let chunker = TextChunker::new(self.config.chunking.batch_size);
        for chunk in chunker.chunks(text) {
            summary.chunks += 1;
            self.state = PipelineState::Extracting { chunk: chunk.index };
            tracing::info!("[{}] Chunk {} ({} chars)", name, chunk.index, chunk.size());

            let topics = match self.topics.extract_topics(chunk.text).await {
                Ok(topics) => topics,
                Err(e) if e.is_unit_failure() => {
                    tracing::warn!(
                        "[{}] Chunk {}: topic extraction failed, skipping chunk: {}",
                        path.display(),
                        chunk.index,
                        e
                    );
                    summary.chunk_failures += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if topics.is_empty() {
                tracing::info!("[{}] Chunk {}: no topics", name, chunk.index);
            } else {
                tracing::info!("[{}] Chunk {}: topics {}", name, chunk.index, topics.join("; "));
            }

            for topic in topics {
                summary.topics += 1;
                self.state = PipelineState::GeneratingNotes {
                    chunk: chunk.index,
                    topic: topic.clone(),
                };

                match self
                    .writer
                    .write_note_record(&topic, chunk.text, &mut self.registry)
                    .await
                {
                    Ok(record) => {
                        summary.dangling_links += record.dangling_links.len();
                        match record.outcome {
                            WriteOutcome::Written { .. } => summary.notes_written += 1,
                            WriteOutcome::Skipped { .. } => summary.notes_skipped += 1,
                        }
                    }
                    Err(e) if e.is_unit_failure() || matches!(e, Error::Io(_)) => {
                        tracing::warn!(
                            "[{}] Chunk {}, topic '{}': note generation or write failed: {}",
                            path.display(),
                            chunk.index,
                            topic,
                            e
                        );
                        summary.note_failures += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        summary.documents_processed += 1;
        self.state = PipelineState::Idle;
        Ok(())
    }

    /// Read and parse one file
    async fn extract(&self, path: &Path) -> Result<Document> {
        let name = display_name(path);
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| Error::file_parse(&name, format!("cannot read file: {}", e)))?;
        let file_size = data.len() as u64;
        let file_type = FileType::from_path(path);

        let parsed = if file_type.has_native_parser() {
            parse_blocking(name.clone(), move |filename| FileParser::parse(filename, &data)).await?
        } else if self.external_parser.is_available() {
            tracing::info!("[{}] Using external parser...", name);
            self.external_parser.parse(&name, &data).await?
        } else {
            return Err(Error::UnsupportedFileType(format!(
                "{} - no built-in parser and external parsing is disabled",
                file_type.display_name()
            )));
        };

        let ParsedDocument {
            file_type,
            content,
            content_hash,
            total_pages,
        } = parsed;

        if content.trim().is_empty() {
            return Err(Error::file_parse(&name, "no text extracted"));
        }
        tracing::info!(
            "[{}] Extracted {} chars from {}{}",
            name,
            content.chars().count(),
            file_type.display_name(),
            total_pages
                .map(|p| format!(" ({} sections)", p))
                .unwrap_or_default()
        );

        Ok(Document::new(path.to_path_buf(), file_type, content_hash, file_size, content))
    }

    fn abort_document(&mut self, path: &Path, err: Error, summary: &mut RunSummary) -> Result<()> {
        if !err.is_extraction() {
            return Err(err);
        }
        tracing::error!("[{}] Aborting document: {}", path.display(), err);
        summary.documents_aborted += 1;
        self.state = PipelineState::Aborted;
        Ok(())
    }
}

/// Run a parser on the blocking pool. A panicking parser aborts only its
/// document.
async fn parse_blocking<F>(filename: String, parse: F) -> Result<ParsedDocument>
where
    F: FnOnce(&str) -> Result<ParsedDocument> + Send + 'static,
{
    let name = filename.clone();
    tokio::task::spawn_blocking(move || parse(&filename))
        .await
        .map_err(|e| Error::file_parse(name, format!("parser crashed: {}", e)))?
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parser_panic_is_extraction_error() {
        let err = parse_blocking("broken.pdf".to_string(), |_| -> Result<ParsedDocument> {
            panic!("unexpected end of xref table")
        })
        .await
        .unwrap_err();

        assert!(err.is_extraction());
        assert!(err.to_string().contains("broken.pdf"));
    }

    #[tokio::test]
    async fn test_parse_blocking_passes_result_through() {
        let parsed = parse_blocking("a.txt".to_string(), |name| FileParser::parse(name, b"Hello."))
            .await
            .unwrap();
        assert_eq!(parsed.content, "Hello.");
    }
}
