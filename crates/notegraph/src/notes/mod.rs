//! Topic extraction, note writing and title deduplication

mod registry;
mod sanitize;
mod topics;
mod writer;

pub use registry::{persist_new, TitleRegistry};
pub use sanitize::{sanitize_title, MAX_TITLE_BYTES, MAX_TITLE_CHARS};
pub use topics::{TopicExtractor, MAX_TOPICS};
pub use writer::{NoteRecord, NoteWriter};
