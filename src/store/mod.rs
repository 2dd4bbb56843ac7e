//! Vector storage for embedded chunks.
//!
//! - [`VectorStoreGateway`] embeds text and talks to a backend
//! - [`VectorBackend`] implementations hold the collections
//! - [`CandidateSource`] is the query seam the retrieval agent depends on

pub mod backend;
pub mod gateway;
pub mod types;

pub use backend::{FileBackend, InMemoryBackend, VectorBackend};
pub use gateway::VectorStoreGateway;
pub use types::{Candidate, ChunkMetadata, DistanceMetric, IndexedVector, rank};

use thiserror::Error;

use crate::vector::EmbeddingError;

/// Errors from vector storage operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Invalid collection name '{0}': use ASCII letters, digits, '_' or '-'")]
    InvalidCollectionName(String),

    #[error("Dimension mismatch in collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Anything that can produce ranked candidates for a query.
pub trait CandidateSource: Send + Sync {
    /// Up to `top_k` candidates ordered by ascending distance.
    fn candidates(&self, query: &str, top_k: usize) -> StoreResult<Vec<Candidate>>;
}
