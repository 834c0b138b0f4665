//! Remote document partitioning (Unstructured API) for formats without a built-in parser

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::FileType;

use super::parser::{hash_content, ParsedDocument};

/// External parser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalParserConfig {
    /// Send unknown formats to the partition API
    pub enabled: bool,
    /// Unstructured.io API key (optional, uses free tier if not set)
    pub unstructured_api_key: Option<String>,
    /// Unstructured.io API URL
    pub unstructured_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ExternalParserConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            unstructured_api_key: None,
            unstructured_url: "https://api.unstructured.io/general/v0/general".to_string(),
            timeout_secs: 120,
        }
    }
}

/// External document parser
pub struct ExternalParser {
    client: Client,
    config: ExternalParserConfig,
}

#[derive(Debug, Deserialize)]
struct UnstructuredElement {
    #[serde(default)]
    text: String,
}

impl ExternalParser {
    /// Create a new external parser
    pub fn new(config: ExternalParserConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Check if external parsing is available
    pub fn is_available(&self) -> bool {
        self.config.enabled
    }

    /// Partition a document into elements and join their text with newlines
    pub async fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        if !self.config.enabled {
            return Err(Error::UnsupportedFileType(format!(
                "{} - external parsing is disabled",
                filename
            )));
        }

        let form = reqwest::multipart::Form::new().part(
            "files",
            reqwest::multipart::Part::bytes(data.to_vec()).file_name(filename.to_string()),
        );

        let mut request = self.client.post(&self.config.unstructured_url).multipart(form);

        if let Some(ref api_key) = self.config.unstructured_api_key {
            request = request.header("unstructured-api-key", api_key);
        }

        let response = request.send().await.map_err(|e| {
            Error::file_parse(filename, format!("partition request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::file_parse(
                filename,
                format!("partition API error: {} - {}", status, body),
            ));
        }

        let elements: Vec<UnstructuredElement> = response.json().await.map_err(|e| {
            Error::file_parse(filename, format!("invalid partition response: {}", e))
        })?;

        let content = elements
            .into_iter()
            .map(|el| el.text)
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let extension = filename.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
        Ok(ParsedDocument {
            file_type: FileType::from_extension(extension),
            content_hash: hash_content(&content),
            content,
            total_pages: None,
        })
    }
}
