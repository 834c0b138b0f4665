//! Source documents and their detected formats

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Supported file types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// CSV file
    Csv,
    /// Excel spreadsheet (.xlsx)
    Xlsx,
    /// Old Excel spreadsheet (.xls)
    Xls,
    /// Anything without a native parser, keyed by extension
    Other(String),
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            "csv" => Self::Csv,
            "xlsx" => Self::Xlsx,
            "xls" => Self::Xls,
            other => Self::Other(other.to_string()),
        }
    }

    /// Detect file type from a path's extension
    pub fn from_path(path: &Path) -> Self {
        Self::from_extension(
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default(),
        )
    }

    /// Whether a built-in parser handles this type
    pub fn has_native_parser(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Csv => "CSV",
            Self::Xlsx => "Excel Spreadsheet (.xlsx)",
            Self::Xls => "Excel Spreadsheet (.xls)",
            Self::Other(ext) => ext.as_str(),
        }
    }
}

/// A document read from the input directory
#[derive(Debug, Clone)]
pub struct Document {
    /// Path of the source file
    pub path: PathBuf,
    /// Detected format
    pub file_type: FileType,
    /// SHA-256 of the extracted text
    pub content_hash: String,
    /// File size in bytes
    pub file_size: u64,
    /// Extracted plain text
    pub text: String,
    /// English text, filled in after translation
    pub translated: Option<String>,
}

impl Document {
    /// Create a document from extracted text
    pub fn new(path: PathBuf, file_type: FileType, content_hash: String, file_size: u64, text: String) -> Self {
        Self {
            path,
            file_type,
            content_hash,
            file_size,
            text,
            translated: None,
        }
    }

    /// File name for log messages
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Text handed to the chunker: the translation when present
    pub fn working_text(&self) -> &str {
        self.translated.as_deref().unwrap_or(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("md"), FileType::Markdown);
        assert_eq!(FileType::from_extension("pptx"), FileType::Other("pptx".into()));
        assert!(!FileType::from_extension("rtf").has_native_parser());
        assert!(FileType::from_path(Path::new("notes/a.docx")).has_native_parser());
    }

    #[test]
    fn test_working_text_prefers_translation() {
        let mut doc = Document::new(
            PathBuf::from("in/a.txt"),
            FileType::Txt,
            String::new(),
            4,
            "Hola".into(),
        );
        assert_eq!(doc.working_text(), "Hola");
        doc.translated = Some("Hello".into());
        assert_eq!(doc.working_text(), "Hello");
        assert_eq!(doc.display_name(), "a.txt");
    }
}
