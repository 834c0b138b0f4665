//! Provider abstractions for text generation
//!
//! The pipeline only talks to [`LlmProvider`], so the HTTP client can be
//! swapped for another backend or a scripted provider in tests.

pub mod llm;

pub use llm::{LlmProvider, ModelRole};
