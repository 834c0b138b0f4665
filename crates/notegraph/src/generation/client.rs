//! Chat-completions client (Together AI and other OpenAI-compatible APIs) with retry logic

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{LlmConfig, ModelProfile};
use crate::error::{Error, Result};
use crate::providers::{LlmProvider, ModelRole};

/// Chat-completions client with automatic retry
pub struct ChatClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
    /// Bearer token
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetition_penalty: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    /// Create a new client
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(2)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key: api_key.into(),
        })
    }

    fn profile(&self, role: ModelRole) -> &ModelProfile {
        match role {
            ModelRole::Topics => &self.config.topics,
            ModelRole::Writing => &self.config.writing,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Retry a request with exponential backoff while the failure is transient
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < max_retries && e.is_transient() => {
                    let delay = Duration::from_millis(
                        self.config.retry_backoff_ms.saturating_mul(2u64.saturating_pow(attempt)),
                    );
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, profile: &ModelProfile, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &profile.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: profile.temperature,
            max_tokens: profile.max_tokens,
            repetition_penalty: (profile.repetition_penalty != 1.0)
                .then_some(profile.repetition_penalty),
        };

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Config(format!(
                "API credential rejected: HTTP {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::llm("response contained no completion"))
    }

    fn map_transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.config.timeout_secs)
        } else {
            Error::Http(err)
        }
    }
}

#[async_trait]
impl LlmProvider for ChatClient {
    async fn generate(&self, role: ModelRole, prompt: &str) -> Result<String> {
        let profile = self.profile(role);
        tracing::debug!(
            "Generating with {} model {} ({} prompt chars)",
            role,
            profile.model,
            prompt.len()
        );

        self.retry_request(|| self.send_once(profile, prompt)).await
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .client
            .get(self.url("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "chat-completions"
    }

    fn model(&self, role: ModelRole) -> &str {
        &self.profile(role).model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> LlmConfig {
        LlmConfig {
            base_url: format!("{}/v1", server.uri()),
            timeout_secs: 5,
            max_retries: 2,
            retry_backoff_ms: 1,
            ..LlmConfig::default()
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[tokio::test]
    async fn test_generate_sends_profile_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test_key"))
            .and(body_partial_json(json!({
                "model": "meta-llama/Llama-3.2-11B-Vision-Instruct-Turbo",
                "max_tokens": 3500,
                "messages": [{"role": "user", "content": "write"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("done")))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server), "test_key").unwrap();
        let out = client.generate(ModelRole::Writing, "write").await.unwrap();
        assert_eq!(out, "done");
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server), "k").unwrap();
        let out = client.generate(ModelRole::Topics, "p").await.unwrap();
        assert_eq!(out, "ok");
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server), "k").unwrap();
        let err = client.generate(ModelRole::Topics, "p").await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 400, .. }));
        assert!(err.is_unit_failure());
    }

    #[tokio::test]
    async fn test_rejected_credential_is_config_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = ChatClient::new(&config_for(&server), "wrong").unwrap();
        let err = client.generate(ModelRole::Topics, "p").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = LlmConfig {
            timeout_secs: 1,
            max_retries: 0,
            ..config_for(&server)
        };
        let client = ChatClient::new(&config, "k").unwrap();
        let err = client.generate(ModelRole::Topics, "p").await.unwrap_err();
        assert!(matches!(err, Error::Timeout(1)));
    }
}
