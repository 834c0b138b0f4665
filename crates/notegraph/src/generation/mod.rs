//! LLM generation: chat client, prompts, structured decoding and translation

mod client;
mod prompt;
mod structured;
mod translate;

pub use client::ChatClient;
pub use prompt::PromptBuilder;
pub use structured::{decode, Decoded, StructuredGenerator, StructuredOutput, TopicsOutput};
pub use translate::{LlmTranslator, PassthroughTranslator, Translator};
