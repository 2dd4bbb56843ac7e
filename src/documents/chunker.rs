//! Document chunking strategies.
//!
//! Provides the `Chunker` trait and the sentence-aligned implementation used
//! on the indexing path.

use super::config::{ChunkingConfig, OverlapPolicy};
use super::types::{Chunk, DocumentRecord};

/// Delimiter sentences are split on.
const SENTENCE_DELIMITER: &str = ". ";

/// Trait for document chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split document content into chunk strings, in document order.
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Vec<String>;

    /// Chunk a loaded record, numbering the chunks within it.
    fn chunk_record(&self, record: &DocumentRecord, config: &ChunkingConfig) -> Vec<Chunk> {
        self.chunk(&record.text, config)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk::new(text, record.source.as_str(), index))
            .collect()
    }
}

/// Sentence chunker: greedy accumulation of `". "`-delimited sentences.
///
/// Algorithm:
/// 1. Split on `". "`, keeping the delimiter on every sentence but the last
/// 2. Append sentences to a buffer while it stays within `chunk_size`
/// 3. When the next sentence would overflow, close the buffer as a chunk
/// 4. Optionally seed the next buffer with the tail of the closed chunk
///
/// A single sentence longer than `chunk_size` becomes its own chunk unsplit.
#[derive(Debug, Default)]
pub struct SentenceChunker;

impl SentenceChunker {
    /// Create a new sentence chunker.
    pub fn new() -> Self {
        Self
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Vec<String> {
        chunk_text(
            content,
            config.chunk_size,
            config.chunk_overlap,
            config.overlap_policy,
        )
    }
}

/// Split `text` into sentence-aligned chunks of at most `max_size` characters.
///
/// `overlap` only has an effect with [`OverlapPolicy::Carry`].
pub fn chunk_text(text: &str, max_size: usize, overlap: usize, policy: OverlapPolicy) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0;

    for sentence in split_sentences(text) {
        let sentence_chars = sentence.chars().count();

        if buffer_chars > 0 && buffer_chars + sentence_chars > max_size {
            let closed = buffer.trim().to_string();
            buffer.clear();
            buffer_chars = 0;

            if policy == OverlapPolicy::Carry && overlap > 0 {
                let tail = overlap_tail(&closed, overlap);
                let tail_chars = tail.chars().count();
                // +1 for the joining space
                if !tail.is_empty() && tail_chars + 1 + sentence_chars <= max_size {
                    buffer.push_str(tail);
                    buffer.push(' ');
                    buffer_chars = tail_chars + 1;
                }
            }

            if !closed.is_empty() {
                chunks.push(closed);
            }
        }

        buffer.push_str(sentence);
        buffer_chars += sentence_chars;
    }

    let last = buffer.trim();
    if !last.is_empty() {
        chunks.push(last.to_string());
    }

    chunks
}

/// Split text into sentences, keeping the delimiter attached to each sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(SENTENCE_DELIMITER) {
        let end = start + pos + SENTENCE_DELIMITER.len();
        sentences.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

/// Last `overlap` characters of a chunk, moved forward to the next word start.
///
/// Returns an empty string when the window holds only part of a single word.
fn overlap_tail(chunk: &str, overlap: usize) -> &str {
    let total = chunk.chars().count();
    if total <= overlap {
        return chunk;
    }

    let start = chunk
        .char_indices()
        .nth(total - overlap)
        .map_or(0, |(i, _)| i);
    let tail = &chunk[start..];

    if chunk[..start].ends_with(char::is_whitespace) {
        return tail.trim_start();
    }

    match tail.find(char::is_whitespace) {
        Some(pos) => tail[pos..].trim_start(),
        None => "",
    }
}
