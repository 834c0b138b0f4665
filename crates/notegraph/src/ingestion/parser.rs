//! Multi-format file parser

use calamine::Reader;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Parsed document with extracted text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// Content hash
    pub content_hash: String,
    /// Sheets or pages seen while parsing (if applicable)
    pub total_pages: Option<u32>,
}

impl ParsedDocument {
    fn new(file_type: FileType, content: String, total_pages: Option<u32>) -> Self {
        Self {
            file_type,
            content_hash: hash_content(&content),
            content,
            total_pages,
        }
    }
}

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("")
            .to_lowercase();

        match FileType::from_extension(&extension) {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Docx => Self::parse_docx(filename, data),
            ft @ (FileType::Txt | FileType::Markdown) => Ok(Self::parse_text(data, ft)),
            FileType::Csv => Self::parse_csv(filename, data),
            ft @ (FileType::Xlsx | FileType::Xls) => Self::parse_spreadsheet(filename, data, ft),
            FileType::Other(ext) => Err(Error::UnsupportedFileType(format!(
                "{} - no built-in parser",
                if ext.is_empty() { "<none>" } else { ext.as_str() }
            ))),
        }
    }

    /// Parse PDF document
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let content = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        Ok(ParsedDocument::new(FileType::Pdf, content, None))
    }

    /// Parse DOCX document: paragraph text joined by newlines
    fn parse_docx(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut paragraphs = Vec::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                let mut text = String::new();
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                text.push_str(&t.text);
                            }
                        }
                    }
                }
                paragraphs.push(text);
            }
        }

        Ok(ParsedDocument::new(FileType::Docx, paragraphs.join("\n"), None))
    }

    /// Parse plain text or markdown
    fn parse_text(data: &[u8], file_type: FileType) -> ParsedDocument {
        let content = String::from_utf8_lossy(data).to_string();
        ParsedDocument::new(file_type, content, None)
    }

    /// Parse CSV file into a pipe-separated table
    fn parse_csv(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
        let mut content = String::new();

        let headers = reader
            .headers()
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;
        content.push_str(&headers.iter().collect::<Vec<_>>().join(" | "));
        content.push('\n');

        for record in reader.records() {
            match record {
                Ok(record) => {
                    content.push_str(&record.iter().collect::<Vec<_>>().join(" | "));
                    content.push('\n');
                }
                Err(e) => tracing::warn!("[{}] Skipping malformed CSV row: {}", filename, e),
            }
        }

        Ok(ParsedDocument::new(FileType::Csv, content, None))
    }

    /// Parse Excel spreadsheet, one section per sheet
    fn parse_spreadsheet(filename: &str, data: &[u8], file_type: FileType) -> Result<ParsedDocument> {
        let cursor = std::io::Cursor::new(data);
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut content = String::new();
        let mut sheets = 0u32;

        for sheet_name in workbook.sheet_names().to_vec() {
            let range = match workbook.worksheet_range(&sheet_name) {
                Ok(range) => range,
                Err(e) => {
                    tracing::warn!("[{}] Skipping sheet '{}': {}", filename, sheet_name, e);
                    continue;
                }
            };
            sheets += 1;

            content.push_str(&format!("Sheet: {}\n", sheet_name));
            for row in range.rows() {
                let row_text: Vec<String> = row
                    .iter()
                    .map(|cell| match cell {
                        calamine::Data::Empty => String::new(),
                        calamine::Data::String(s) => s.clone(),
                        calamine::Data::Float(f) => f.to_string(),
                        calamine::Data::Int(i) => i.to_string(),
                        calamine::Data::Bool(b) => b.to_string(),
                        calamine::Data::DateTime(dt) => dt.to_string(),
                        _ => String::new(),
                    })
                    .collect();

                if !row_text.iter().all(|s| s.is_empty()) {
                    content.push_str(&row_text.join(" | "));
                    content.push('\n');
                }
            }
            content.push('\n');
        }

        Ok(ParsedDocument::new(file_type, content, Some(sheets)))
    }
}

/// SHA-256 of extracted text, used to spot repeated documents
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_and_markdown() {
        let parsed = FileParser::parse("notes.txt", "Hello world.".as_bytes()).unwrap();
        assert_eq!(parsed.file_type, FileType::Txt);
        assert_eq!(parsed.content, "Hello world.");
        assert_eq!(parsed.content_hash.len(), 64);

        let parsed = FileParser::parse("README.MD", b"# Title").unwrap();
        assert_eq!(parsed.file_type, FileType::Markdown);
    }

    #[test]
    fn test_parse_csv_renders_table() {
        let data = b"name,score\nada,10\ngrace,12\n";
        let parsed = FileParser::parse("scores.csv", data).unwrap();
        assert_eq!(parsed.content, "name | score\nada | 10\ngrace | 12\n");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = FileParser::parse("deck.pptx", b"").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));

        let err = FileParser::parse("Makefile", b"all:").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));
    }

    #[test]
    fn test_corrupt_docx_is_parse_error() {
        let err = FileParser::parse("broken.docx", b"definitely not a zip").unwrap_err();
        assert!(err.is_extraction());
    }
}
