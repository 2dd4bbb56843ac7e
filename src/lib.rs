pub mod agent;
pub mod cli;
pub mod config;
pub mod documents;
pub mod llm;
pub mod logging;
pub mod store;
pub mod vector;

pub use agent::{AgentConfig, AgentError, AnswerKind, AnsweredResult, RetrievalAgent};
pub use config::Settings;
pub use documents::{Chunk, ChunkingConfig, DocumentLoader, DocumentRecord, DocumentType};
pub use llm::{GeminiClient, LlmError, TextGenerator};
pub use store::{Candidate, CandidateSource, DistanceMetric, StoreError, VectorStoreGateway};
pub use vector::{EmbeddingGenerator, FastEmbedGenerator, MockEmbeddingGenerator};
