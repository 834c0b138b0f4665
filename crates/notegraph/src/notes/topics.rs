//! Topic extraction for a chunk

use crate::error::Result;
use crate::generation::{PromptBuilder, StructuredGenerator, StructuredOutput, TopicsOutput};
use crate::providers::ModelRole;

/// Maximum number of topics kept per chunk
pub const MAX_TOPICS: usize = 3;

/// Asks the topics model what a chunk is about
#[derive(Clone)]
pub struct TopicExtractor {
    generator: StructuredGenerator,
}

impl TopicExtractor {
    pub fn new(generator: StructuredGenerator) -> Self {
        Self { generator }
    }

    /// Up to three trimmed, non-empty topics for `chunk`
    pub async fn extract_topics(&self, chunk: &str) -> Result<Vec<String>> {
        let prompt = PromptBuilder::build_topics_prompt(chunk, TopicsOutput::FORMAT_INSTRUCTIONS);
        let output: TopicsOutput = self.generator.generate(ModelRole::Topics, &prompt).await?;
        Ok(output.into_topics(MAX_TOPICS))
    }
}
