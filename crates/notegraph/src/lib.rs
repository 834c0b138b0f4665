//! notegraph: turns a folder of documents into a vault of cross-linked topic notes
//!
//! Each document is extracted to plain text, translated to English, split into
//! sentence-aligned chunks, and sent through two LLM passes: one naming the
//! topics of a chunk, one writing a Markdown note per topic. Notes are written
//! as `<title>.md`, one file per unique title, and may link to each other with
//! `[[wikilinks]]`.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod notes;
pub mod processing;
pub mod providers;
pub mod types;

pub use config::NotesConfig;
pub use error::{Error, Result};
pub use processing::{Pipeline, PipelineState, RunSummary};
pub use types::{Document, FileType, Note, WriteOutcome};
