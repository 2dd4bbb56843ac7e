//! Core types for loaded documents and their chunks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// File formats the loader knows how to dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Docx,
    Txt,
    Csv,
    Xlsx,
    Pptx,
    /// Any other extension, kept verbatim (lowercased).
    Unsupported(String),
}

impl DocumentType {
    /// Map a file extension (case-insensitive) to a document type.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" => Self::Txt,
            "csv" => Self::Csv,
            "xlsx" => Self::Xlsx,
            "pptx" => Self::Pptx,
            _ => Self::Unsupported(ext),
        }
    }

    /// Determine the type from a file name: the text after the last `.`.
    ///
    /// A name without a dot uses the whole name as its extension.
    pub fn from_file_name(file_name: &str) -> Self {
        let ext = file_name.rsplit('.').next().unwrap_or(file_name);
        Self::from_extension(ext)
    }

    /// The extension string this type is keyed by.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
            Self::Unsupported(ext) => ext,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One loaded unit of a document (a whole file, a PDF page, a slide).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Extracted text.
    pub text: String,

    /// Where the text came from, usually the uploaded file name.
    pub source: String,

    /// Format the text was extracted from.
    pub doc_type: DocumentType,

    /// 1-based page or slide number for paged formats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_or_slide: Option<u32>,
}

impl DocumentRecord {
    /// Create a record for an unpaged document.
    pub fn new(text: impl Into<String>, source: impl Into<String>, doc_type: DocumentType) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            doc_type,
            page_or_slide: None,
        }
    }

    /// Attach a page or slide number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page_or_slide = Some(page);
        self
    }
}

/// A bounded slice of document text, ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The text content of this chunk.
    pub text: String,

    /// Source identifier of the parent document.
    pub source: String,

    /// Position of this chunk within its document.
    pub chunk_index: usize,

    /// Length of `text` in characters.
    pub length: usize,
}

impl Chunk {
    pub fn new(text: String, source: impl Into<String>, chunk_index: usize) -> Self {
        let length = text.chars().count();
        Self {
            text,
            source: source.into(),
            chunk_index,
            length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_from_file_name() {
        assert_eq!(DocumentType::from_file_name("report.PDF"), DocumentType::Pdf);
        assert_eq!(DocumentType::from_file_name("a.b.docx"), DocumentType::Docx);
        assert_eq!(DocumentType::from_file_name("notes.txt"), DocumentType::Txt);
        assert_eq!(
            DocumentType::from_file_name("image.PNG"),
            DocumentType::Unsupported("png".to_string())
        );
        assert_eq!(
            DocumentType::from_file_name("README"),
            DocumentType::Unsupported("readme".to_string())
        );
    }

    #[test]
    fn test_document_type_display() {
        assert_eq!(DocumentType::Xlsx.to_string(), "xlsx");
        assert_eq!(DocumentType::Unsupported("md".into()).to_string(), "md");
        assert!(!DocumentType::Unsupported("md".into()).is_supported());
        assert!(DocumentType::Csv.is_supported());
    }

    #[test]
    fn test_chunk_length_counts_chars() {
        let chunk = Chunk::new("héllo".to_string(), "a.txt", 0);
        assert_eq!(chunk.length, 5);
        assert_eq!(chunk.source, "a.txt");
    }

    #[test]
    fn test_record_with_page() {
        let record = DocumentRecord::new("text", "deck.pptx", DocumentType::Pptx).with_page(3);
        assert_eq!(record.page_or_slide, Some(3));
    }
}
