//! Configuration module for the RAG pipeline.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `RAGLINE_` and use double underscores
//! to separate nested levels:
//! - `RAGLINE_RETRIEVAL__TOP_K=8` sets `retrieval.top_k`
//! - `RAGLINE_RETRIEVAL__USE_LLM=true` sets `retrieval.use_llm`
//! - `RAGLINE_CHUNKING__CHUNK_SIZE=800` sets `chunking.chunk_size`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::documents::ChunkingConfig;
use crate::store::DistanceMetric;

/// Directory holding settings and the default index.
pub const CONFIG_DIR: &str = ".ragline";

/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "RAGLINE_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory where the vector store persists its collections
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Name of the collection chunks are stored in
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Chunking of loaded documents before indexing
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Query-time retrieval and answer assembly
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// LLM synthesis settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// Number of candidates fetched from the vector store
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Number of answers returned per query
    #[serde(default = "default_n_best")]
    pub n_best: usize,

    /// Maximum distance a candidate may have to be kept (inclusive).
    ///
    /// Lower is closer. The scale follows `store.metric`: cosine distance lies
    /// in `0..=2`, while squared L2 on unit vectors is twice the cosine
    /// distance, so the same value keeps fewer candidates under `squared_l2`.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Prepend an LLM-synthesized answer
    #[serde(default = "default_false")]
    pub use_llm: bool,

    /// Sub-chunk size used to cut candidates into answer snippets
    #[serde(default = "default_sub_chunk_size")]
    pub sub_chunk_size: usize,

    /// Overlap between answer snippets
    #[serde(default = "default_sub_chunk_overlap")]
    pub sub_chunk_overlap: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Where model files are cached (defaults to the user cache directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Show download progress when fetching the model
    #[serde(default = "default_true")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct StoreConfig {
    /// Distance metric used to rank candidates
    #[serde(default)]
    pub metric: DistanceMetric,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LlmConfig {
    /// Generation model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Base URL of the generation API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level for all targets
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `agent = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(".ragline/index")
}
fn default_collection() -> String {
    "rag_collection".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_top_k() -> usize {
    5
}
fn default_n_best() -> usize {
    3
}
fn default_similarity_threshold() -> f32 {
    0.6
}
fn default_sub_chunk_size() -> usize {
    300
}
fn default_sub_chunk_overlap() -> usize {
    50
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_llm_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            collection: default_collection(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            llm: LlmConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            n_best: default_n_best(),
            similarity_threshold: default_similarity_threshold(),
            use_llm: false,
            sub_chunk_size: default_sub_chunk_size(),
            sub_chunk_overlap: default_sub_chunk_overlap(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
            show_download_progress: true,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl EmbeddingConfig {
    /// Cache directory for model files, falling back to `<user cache>/ragline/models`.
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(CONFIG_DIR))
                .join("ragline")
                .join("models")
        })
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(path.as_ref()))
            // Double underscore (__) separates nested levels, single underscore stays
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
            .map_err(Box::new)
    }

    /// Find `.ragline/settings.toml` searching from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        self.chunking.validate()?;

        let retrieval = &self.retrieval;
        if !(1..=20).contains(&retrieval.top_k) {
            return Err(format!(
                "retrieval.top_k ({}) must be between 1 and 20",
                retrieval.top_k
            ));
        }
        if !(1..=10).contains(&retrieval.n_best) {
            return Err(format!(
                "retrieval.n_best ({}) must be between 1 and 10",
                retrieval.n_best
            ));
        }
        if !retrieval.similarity_threshold.is_finite() || retrieval.similarity_threshold < 0.0 {
            return Err(format!(
                "retrieval.similarity_threshold ({}) must be a non-negative number",
                retrieval.similarity_threshold
            ));
        }
        if retrieval.sub_chunk_overlap >= retrieval.sub_chunk_size {
            return Err(format!(
                "retrieval.sub_chunk_overlap ({}) must be less than retrieval.sub_chunk_size ({})",
                retrieval.sub_chunk_overlap, retrieval.sub_chunk_size
            ));
        }

        if self.collection.trim().is_empty() {
            return Err("collection name must not be empty".to_string());
        }

        Ok(())
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
