//! Turning uploaded file bytes into document records.
//!
//! Dispatch is on [`DocumentType`]. Plain text and CSV are handled here;
//! binary office formats are delegated to a registered [`FormatExtractor`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::types::{DocumentRecord, DocumentType};

/// Text of the record returned for an extension the loader does not handle.
pub const UNSUPPORTED_FORMAT_TEXT: &str = "Unsupported file format.";

/// Errors from document loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("{file} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        file: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("No extractor registered for {doc_type} files ({file})")]
    NoExtractor { file: String, doc_type: DocumentType },

    #[error("Failed to extract text from {file}: {reason}")]
    Extraction { file: String, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Extracts text records from the raw bytes of one file format.
pub trait FormatExtractor: Send + Sync {
    /// Returns zero or more records; an empty document yields none.
    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<DocumentRecord>, LoaderError>;
}

/// UTF-8 text passed through as a single record.
///
/// Used for `txt` and for `csv`, where the raw table text is the rendering.
#[derive(Debug, Clone)]
pub struct PlainTextExtractor {
    doc_type: DocumentType,
}

impl PlainTextExtractor {
    pub fn new(doc_type: DocumentType) -> Self {
        Self { doc_type }
    }
}

impl FormatExtractor for PlainTextExtractor {
    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<DocumentRecord>, LoaderError> {
        let text = std::str::from_utf8(bytes).map_err(|source| LoaderError::InvalidUtf8 {
            file: file_name.to_string(),
            source,
        })?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![DocumentRecord::new(
            text,
            file_name,
            self.doc_type.clone(),
        )])
    }
}

/// Format-dispatching document loader.
pub struct DocumentLoader {
    extractors: HashMap<DocumentType, Box<dyn FormatExtractor>>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader {
    /// Loader with the built-in `txt` and `csv` extractors.
    pub fn new() -> Self {
        let mut extractors: HashMap<DocumentType, Box<dyn FormatExtractor>> = HashMap::new();
        extractors.insert(
            DocumentType::Txt,
            Box::new(PlainTextExtractor::new(DocumentType::Txt)),
        );
        extractors.insert(
            DocumentType::Csv,
            Box::new(PlainTextExtractor::new(DocumentType::Csv)),
        );
        Self { extractors }
    }

    /// Register (or replace) the extractor for a document type.
    pub fn with_extractor(
        mut self,
        doc_type: DocumentType,
        extractor: impl FormatExtractor + 'static,
    ) -> Self {
        self.extractors.insert(doc_type, Box::new(extractor));
        self
    }

    /// Whether `load` can produce real content for this type.
    pub fn can_extract(&self, doc_type: &DocumentType) -> bool {
        self.extractors.contains_key(doc_type)
    }

    /// Load a file's bytes, dispatching on the extension of `file_name`.
    pub fn load(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<DocumentRecord>, LoaderError> {
        let doc_type = DocumentType::from_file_name(file_name);

        if !doc_type.is_supported() {
            tracing::debug!(target: "documents", "unsupported format '{doc_type}' for {file_name}");
            return Ok(vec![DocumentRecord::new(
                UNSUPPORTED_FORMAT_TEXT,
                file_name,
                doc_type,
            )]);
        }

        let extractor = self
            .extractors
            .get(&doc_type)
            .ok_or_else(|| LoaderError::NoExtractor {
                file: file_name.to_string(),
                doc_type: doc_type.clone(),
            })?;

        let records = extractor.extract(file_name, bytes)?;
        tracing::debug!(target: "documents", "loaded {} record(s) from {file_name}", records.len());
        Ok(records)
    }

    /// Read a file from disk and load it under its file name.
    pub fn load_path(&self, path: &Path) -> Result<Vec<DocumentRecord>, LoaderError> {
        let bytes = std::fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.load(&file_name, &bytes)
    }
}
