//! Embedding generation.
//!
//! [`FastEmbedGenerator`] runs a local ONNX sentence-embedding model through
//! fastembed. [`MockEmbeddingGenerator`] is a deterministic bag-of-words
//! stand-in for tests and offline use.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use thiserror::Error;

use super::similarity::normalize;
use crate::config::EmbeddingConfig;

/// Errors from embedding generation.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Unknown embedding model '{0}'")]
    UnknownModel(String),

    #[error("Failed to initialize embedding model: {0}")]
    ModelInit(String),

    #[error("Failed to generate embeddings: {0}")]
    Generation(String),

    #[error("Embedding count mismatch: {texts} texts produced {embeddings} embeddings")]
    CountMismatch { texts: usize, embeddings: usize },
}

/// Maps text to fixed-dimension vectors.
///
/// Output order matches input order, one vector per text.
pub trait EmbeddingGenerator: Send + Sync {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Length of every vector this generator produces.
    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;

    /// Embed a single text.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut embeddings = self.generate_embeddings(&[text])?;
        match embeddings.pop() {
            Some(embedding) if embeddings.is_empty() => Ok(embedding),
            _ => Err(EmbeddingError::CountMismatch {
                texts: 1,
                embeddings: embeddings.len() + 1,
            }),
        }
    }
}

/// Parse a configured model name into a fastembed model.
pub fn parse_model(name: &str) -> Result<EmbeddingModel, EmbeddingError> {
    match name {
        "AllMiniLML6V2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML12V2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" => Ok(EmbeddingModel::BGEBaseENV15),
        "MultilingualE5Small" => Ok(EmbeddingModel::MultilingualE5Small),
        other => Err(EmbeddingError::UnknownModel(other.to_string())),
    }
}

/// fastembed-backed generator.
pub struct FastEmbedGenerator {
    // embed() needs &mut; the trait takes &self
    model: Mutex<TextEmbedding>,
    dimension: usize,
    model_name: String,
}

impl FastEmbedGenerator {
    /// Load the configured model, downloading it into the cache dir on first use.
    pub fn from_settings(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let model = parse_model(&config.model)?;
        let cache_dir = config.effective_cache_dir();

        tracing::info!(
            target: "store",
            "loading embedding model {} (cache: {})",
            config.model,
            cache_dir.display()
        );

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(config.show_download_progress),
        )
        .map_err(|e| EmbeddingError::ModelInit(e.to_string()))?;

        // Probe the output width once
        let probe = text_model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::Generation(e.to_string()))?;
        let dimension = probe
            .into_iter()
            .next()
            .map(|v| v.len())
            .ok_or(EmbeddingError::CountMismatch {
                texts: 1,
                embeddings: 0,
            })?;

        tracing::debug!(target: "store", "embedding model ready: {dimension} dimensions");

        Ok(Self {
            model: Mutex::new(text_model),
            dimension,
            model_name: config.model.clone(),
        })
    }
}

impl EmbeddingGenerator for FastEmbedGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .lock()
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Generation(e.to_string()))?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                texts: texts.len(),
                embeddings: embeddings.len(),
            });
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Deterministic hashed bag-of-words embeddings.
///
/// Each lowercase alphanumeric token adds 1.0 to the bucket its FNV-1a hash
/// selects; the result is L2-normalized. Texts sharing words are close, texts
/// sharing none are orthogonal.
#[derive(Debug, Clone)]
pub struct MockEmbeddingGenerator {
    dimension: usize,
}

impl MockEmbeddingGenerator {
    pub const DEFAULT_DIMENSION: usize = 384;

    pub fn new() -> Self {
        Self::with_dimension(Self::DEFAULT_DIMENSION)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) as usize % self.dimension;
            vector[bucket] += 1.0;
        }
        normalize(&mut vector);
        vector
    }
}

impl Default for MockEmbeddingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingGenerator for MockEmbeddingGenerator {
    fn generate_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-bag-of-words"
    }
}

fn fnv1a(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    s.bytes()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;

    #[test]
    fn test_parse_model() {
        assert!(matches!(
            parse_model("AllMiniLML6V2"),
            Ok(EmbeddingModel::AllMiniLML6V2)
        ));
        assert!(matches!(
            parse_model("NotAModel"),
            Err(EmbeddingError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_mock_is_deterministic() {
        let generator = MockEmbeddingGenerator::new();
        let a = generator.embed_one("The cat sat.").unwrap();
        let b = generator.embed_one("The cat sat.").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 384);
    }

    #[test]
    fn test_mock_is_case_and_punctuation_insensitive() {
        let generator = MockEmbeddingGenerator::new();
        let a = generator.embed_one("cat").unwrap();
        let b = generator.embed_one("CAT!").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mock_similarity_follows_overlap() {
        let generator = MockEmbeddingGenerator::new();
        let embeddings = generator
            .generate_embeddings(&["cat", "The cat sat.", "Quantum chromodynamics"])
            .unwrap();
        assert_eq!(embeddings.len(), 3);

        let related = cosine_similarity(&embeddings[0], &embeddings[1]);
        let unrelated = cosine_similarity(&embeddings[0], &embeddings[2]);
        assert!(related > unrelated);
        assert!(related > 0.5);
    }

    #[test]
    fn test_mock_empty_text_is_zero_vector() {
        let generator = MockEmbeddingGenerator::with_dimension(8);
        let v = generator.embed_one("   ").unwrap();
        assert_eq!(v, vec![0.0; 8]);
    }

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(fnv1a(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a("a"), 0xaf63_dc4c_8601_ec8c);
    }
}
