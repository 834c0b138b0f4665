//! LLM provider trait for structured generation

use async_trait::async_trait;

use crate::error::Result;

/// Which model profile a request runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRole {
    /// Topic extraction, output repair and translation
    Topics,
    /// Note writing
    Writing,
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelRole::Topics => write!(f, "topics"),
            ModelRole::Writing => write!(f, "writing"),
        }
    }
}

/// Trait for prompt-in, text-out generation
///
/// Implementations:
/// - `ChatClient`: OpenAI-compatible chat completions (Together AI by default)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for `prompt` with the model configured for `role`
    async fn generate(&self, role: ModelRole, prompt: &str) -> Result<String>;

    /// Check if the provider is reachable and accepts the credential
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model used for `role`
    fn model(&self, role: ModelRole) -> &str;
}
