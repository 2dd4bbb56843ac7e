//! Embeddings and vector math.

pub mod embedding;
pub mod similarity;

pub use embedding::{
    EmbeddingError, EmbeddingGenerator, FastEmbedGenerator, MockEmbeddingGenerator, parse_model,
};
pub use similarity::{cosine_distance, cosine_similarity, normalize, squared_l2_distance};
