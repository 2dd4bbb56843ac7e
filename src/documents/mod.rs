//! Document loading and chunking for the indexing path.
//!
//! This module provides:
//! - Format-dispatching loading of uploaded files into records
//! - Sentence-aligned chunking with a configurable overlap policy
//! - The recursive splitter the agent uses to re-split retrieved chunks

pub mod chunker;
pub mod config;
pub mod loader;
pub mod splitter;
pub mod types;

pub use chunker::{Chunker, SentenceChunker, chunk_text};
pub use config::{ChunkingConfig, OverlapPolicy};
pub use loader::{
    DocumentLoader, FormatExtractor, LoaderError, PlainTextExtractor, UNSUPPORTED_FORMAT_TEXT,
};
pub use splitter::RecursiveSplitter;
pub use types::{Chunk, DocumentRecord, DocumentType};
