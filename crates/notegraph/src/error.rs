//! Error types for the note pipeline

use thiserror::Error;

/// Result type alias for notegraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Notegraph errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Translation of a document failed or produced nothing
    #[error("Translation failed: {0}")]
    Translation(String),

    /// Model output did not match the expected schema after all repair attempts
    #[error("Malformed model output: {reason}")]
    MalformedModelOutput { reason: String, raw: String },

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Non-success HTTP status from the generation API
    #[error("API error: HTTP {status} - {message}")]
    Api { status: u16, message: String },

    /// A request exceeded its deadline
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a malformed output error, keeping the offending text for diagnostics
    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedModelOutput {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Errors that abort a single document but not the run
    pub fn is_extraction(&self) -> bool {
        matches!(
            self,
            Error::FileParse { .. } | Error::UnsupportedFileType(_) | Error::Translation(_)
        )
    }

    /// Errors that skip a single chunk or topic.
    ///
    /// Transport failures and timeouts count the same as a response that
    /// never decoded.
    pub fn is_unit_failure(&self) -> bool {
        matches!(
            self,
            Error::MalformedModelOutput { .. }
                | Error::Llm(_)
                | Error::Api { .. }
                | Error::Http(_)
                | Error::Timeout(_)
        )
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::Http(_) => true,
            Error::Api { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::file_parse("a.pdf", "broken xref").is_extraction());
        assert!(Error::Translation("empty".into()).is_extraction());
        assert!(!Error::Config("x".into()).is_extraction());

        assert!(Error::malformed("missing field", "{}").is_unit_failure());
        assert!(Error::Timeout(30).is_unit_failure());
        assert!(!Error::Config("x".into()).is_unit_failure());
    }

    #[test]
    fn test_transient_statuses() {
        let api = |status| Error::Api { status, message: String::new() };
        assert!(api(429).is_transient());
        assert!(api(503).is_transient());
        assert!(!api(400).is_transient());
        assert!(Error::Timeout(5).is_transient());
        assert!(!Error::malformed("bad", "").is_transient());
    }

    #[test]
    fn test_file_parse_display() {
        let err = Error::file_parse("report.docx", "not a zip archive");
        assert_eq!(
            err.to_string(),
            "Failed to parse file 'report.docx': not a zip archive"
        );
    }
}
