//! Configuration for the note pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ingestion::ExternalParserConfig;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotesConfig {
    /// Input and output directories
    pub paths: PathsConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Translation configuration
    pub translation: TranslationConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Ingestion configuration
    pub ingestion: IngestionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl NotesConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Check invariants that would otherwise surface halfway through a run
    pub fn validate(&self) -> Result<()> {
        if self.chunking.batch_size == 0 {
            return Err(Error::Config("chunking.batch_size must be greater than 0".into()));
        }
        if self.translation.group_size == 0 {
            return Err(Error::Config("translation.group_size must be greater than 0".into()));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::Config("llm.timeout_secs must be greater than 0".into()));
        }
        if !self.paths.input_dir.is_dir() {
            return Err(Error::Config(format!(
                "'{}' is not a valid directory",
                self.paths.input_dir.display()
            )));
        }
        if self.paths.output_dir.exists() && !self.paths.output_dir.is_dir() {
            return Err(Error::Config(format!(
                "'{}' exists and is not a directory",
                self.paths.output_dir.display()
            )));
        }
        Ok(())
    }

    /// Read the API credential from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.llm.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::Config(format!(
                "environment variable {} is not set",
                self.llm.api_key_env
            ))),
        }
    }
}

/// Input and output directories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory with source documents
    pub input_dir: PathBuf,
    /// Directory where notes are written (created if missing)
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("unstructured"),
            output_dir: PathBuf::from("structured"),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub batch_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { batch_size: 8000 }
    }
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Translate documents to English before chunking
    pub enabled: bool,
    /// Sentences per translation request
    pub group_size: usize,
    /// Target language name used in the prompt
    pub target_language: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            group_size: 40,
            target_language: "English".to_string(),
        }
    }
}

/// Sampling parameters for one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Repetition penalty (provider-specific, omitted when 1.0)
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,
}

fn default_repetition_penalty() -> f32 {
    1.0
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries, in milliseconds
    pub retry_backoff_ms: u64,
    /// Repair requests allowed for malformed structured output
    pub max_repair_attempts: u32,
    /// Model used for topic extraction, output repair and translation
    pub topics: ModelProfile,
    /// Model used for note writing
    pub writing: ModelProfile,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.together.xyz/v1".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout_secs: 120,
            max_retries: 3,
            retry_backoff_ms: 1000,
            max_repair_attempts: 3,
            topics: ModelProfile {
                model: "Qwen/Qwen2.5-72B-Instruct-Turbo".to_string(),
                temperature: 0.3,
                max_tokens: 2000,
                repetition_penalty: 1.0,
            },
            writing: ModelProfile {
                model: "meta-llama/Llama-3.2-11B-Vision-Instruct-Turbo".to_string(),
                temperature: 0.1,
                max_tokens: 3500,
                repetition_penalty: 1.1,
            },
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// File extensions picked up from the input directory (lowercase, no dot)
    pub extensions: Vec<String>,
    /// Remote partitioning for formats without a native parser
    pub external_parser: ExternalParserConfig,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            extensions: ["txt", "md", "csv", "pdf", "docx", "xlsx", "xls"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            external_parser: ExternalParserConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Log file written alongside stderr output (None disables it)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "notegraph=info".to_string(),
            file: Some(PathBuf::from("app.log")),
        }
    }
}
