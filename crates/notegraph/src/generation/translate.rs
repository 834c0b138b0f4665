//! Translation of extracted text into the working language

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ingestion::sentence_groups;
use crate::providers::{LlmProvider, ModelRole};

use super::prompt::PromptBuilder;

/// Turns source text into English text
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate a whole document. An empty result is an error.
    async fn translate(&self, text: &str) -> Result<String>;
}

/// Translator that sends sentence groups to the LLM
pub struct LlmTranslator {
    provider: Arc<dyn LlmProvider>,
    group_size: usize,
    target_language: String,
}

impl LlmTranslator {
    /// Create a translator sending `group_size` sentences per request
    pub fn new(provider: Arc<dyn LlmProvider>, group_size: usize, target_language: impl Into<String>) -> Self {
        Self {
            provider,
            group_size: group_size.max(1),
            target_language: target_language.into(),
        }
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        let groups = sentence_groups(text, self.group_size);
        let total = groups.len();
        let mut output = String::with_capacity(text.len());

        for (i, group) in groups.into_iter().enumerate() {
            let body = group.trim();
            if body.is_empty() {
                output.push_str(group);
                continue;
            }
            let leading = &group[..group.len() - group.trim_start().len()];
            let trailing = &group[leading.len() + body.len()..];

            let prompt = PromptBuilder::build_translation_prompt(body, &self.target_language);
            let translated = self
                .provider
                .generate(ModelRole::Topics, &prompt)
                .await
                .map_err(|e| match e {
                    // a rejected credential fails every later request too
                    Error::Config(_) => e,
                    e => Error::Translation(format!("group {}/{}: {}", i + 1, total, e)),
                })?;

            let translated = translated.trim();
            if translated.is_empty() {
                return Err(Error::Translation(format!(
                    "group {}/{} came back empty",
                    i + 1,
                    total
                )));
            }

            tracing::debug!("Translated sentence group {}/{}", i + 1, total);
            output.push_str(leading);
            output.push_str(translated);
            output.push_str(if trailing.is_empty() { " " } else { trailing });
        }

        let output = output.trim().to_string();
        if output.is_empty() {
            return Err(Error::Translation("document has no text to translate".into()));
        }
        Ok(output)
    }
}

/// Translator used when translation is disabled
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(Error::Translation("document has no text".into()));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Upper {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for Upper {
        async fn generate(&self, _role: ModelRole, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let text = prompt.rsplit("TEXT:\n").next().unwrap_or_default();
            Ok(text.to_uppercase())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "upper"
        }

        fn model(&self, _role: ModelRole) -> &str {
            "upper"
        }
    }

    #[tokio::test]
    async fn test_translates_in_groups_and_keeps_breaks() {
        let provider = Arc::new(Upper {
            prompts: Mutex::new(Vec::new()),
        });
        let translator = LlmTranslator::new(provider.clone(), 2, "English");

        let out = translator.translate("One. Two.\n\nThree.").await.unwrap();
        assert_eq!(out, "ONE. TWO.\n\nTHREE.");
        assert_eq!(provider.prompts.lock().unwrap().len(), 2);
    }

    struct Rejecting;

    #[async_trait]
    impl LlmProvider for Rejecting {
        async fn generate(&self, _role: ModelRole, _prompt: &str) -> Result<String> {
            Err(Error::Config("API credential rejected: HTTP 401".into()))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "rejecting"
        }

        fn model(&self, _role: ModelRole) -> &str {
            "rejecting"
        }
    }

    #[tokio::test]
    async fn test_rejected_credential_is_not_a_translation_error() {
        let translator = LlmTranslator::new(Arc::new(Rejecting), 2, "English");
        let err = translator.translate("Hola. Mundo.").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!err.is_extraction());
    }

    #[tokio::test]
    async fn test_empty_text_is_translation_error() {
        let provider = Arc::new(Upper {
            prompts: Mutex::new(Vec::new()),
        });
        let translator = LlmTranslator::new(provider, 2, "English");
        let err = translator.translate("   ").await.unwrap_err();
        assert!(err.is_extraction());

        let err = PassthroughTranslator.translate("").await.unwrap_err();
        assert!(err.is_extraction());
    }
}
