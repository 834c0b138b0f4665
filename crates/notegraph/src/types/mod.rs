//! Core types for the note pipeline

pub mod document;
pub mod note;

pub use document::{Document, FileType};
pub use note::{Note, WriteOutcome};
