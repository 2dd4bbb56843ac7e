//! Retrieval agent: threshold filtering, sub-chunk answers and optional
//! synthesis.
//!
//! The agent asks a [`CandidateSource`] for nearest chunks, drops those
//! farther than the similarity threshold, re-splits the survivors into short
//! passages and returns the `n_best` distinct passages with provenance. With
//! synthesis enabled, a language model answer built from those passages is
//! put in front.

mod result;

pub use result::{
    AnswerKind, AnsweredResult, EXHAUSTED_TEXT, NO_DOCUMENTS_TEXT, SYNTHESIS_SOURCE,
};

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{RetrievalConfig, Settings};
use crate::documents::RecursiveSplitter;
use crate::llm::{GeminiClient, LlmError, TextGenerator};
use crate::store::{Candidate, CandidateSource, StoreError};

/// Errors from the retrieval agent.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Retrieval failed: {0}")]
    Store(#[from] StoreError),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] LlmError),
}

/// Agent behaviour settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Prepend a synthesized answer.
    pub use_llm: bool,
    /// Maximum distance (inclusive) a candidate may have.
    pub similarity_threshold: f32,
    pub sub_chunk_size: usize,
    pub sub_chunk_overlap: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            use_llm: false,
            similarity_threshold: 0.6,
            sub_chunk_size: 300,
            sub_chunk_overlap: 50,
        }
    }
}

impl From<&RetrievalConfig> for AgentConfig {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            use_llm: config.use_llm,
            similarity_threshold: config.similarity_threshold,
            sub_chunk_size: config.sub_chunk_size,
            sub_chunk_overlap: config.sub_chunk_overlap,
        }
    }
}

pub struct RetrievalAgent {
    source: Arc<dyn CandidateSource>,
    config: AgentConfig,
    generator: Option<Box<dyn TextGenerator>>,
    splitter: RecursiveSplitter,
}

impl std::fmt::Debug for RetrievalAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalAgent")
            .field("config", &self.config)
            .field(
                "generator",
                &self.generator.as_ref().map(|g| (g.provider(), g.model())),
            )
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct RetrievalAgentBuilder {
    source: Option<Arc<dyn CandidateSource>>,
    config: AgentConfig,
    generator: Option<Box<dyn TextGenerator>>,
}

impl RetrievalAgentBuilder {
    /// Builder configured from settings, without a candidate source.
    ///
    /// Creates the Gemini client when synthesis is enabled, so a missing
    /// credential fails here.
    pub fn from_settings(settings: &Settings) -> Result<Self, AgentError> {
        let builder = Self::default().config(AgentConfig::from(&settings.retrieval));
        if !settings.retrieval.use_llm {
            return Ok(builder);
        }

        let client = GeminiClient::from_env(&settings.llm)
            .map_err(|e| AgentError::Configuration(e.to_string()))?;
        Ok(builder.generator(client))
    }

    pub fn source(mut self, source: Arc<dyn CandidateSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn use_llm(mut self, use_llm: bool) -> Self {
        self.config.use_llm = use_llm;
        self
    }

    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    pub fn generator(mut self, generator: impl TextGenerator + 'static) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    pub fn build(self) -> Result<RetrievalAgent, AgentError> {
        let source = self
            .source
            .ok_or_else(|| AgentError::Configuration("no candidate source configured".into()))?;

        let config = self.config;
        if !config.similarity_threshold.is_finite() || config.similarity_threshold < 0.0 {
            return Err(AgentError::Configuration(format!(
                "similarity_threshold must be a non-negative number, got {}",
                config.similarity_threshold
            )));
        }
        if config.sub_chunk_size == 0 || config.sub_chunk_overlap >= config.sub_chunk_size {
            return Err(AgentError::Configuration(format!(
                "sub_chunk_overlap ({}) must be less than sub_chunk_size ({})",
                config.sub_chunk_overlap, config.sub_chunk_size
            )));
        }
        if config.use_llm && self.generator.is_none() {
            return Err(AgentError::Configuration(
                "use_llm is enabled but no text generator was supplied".into(),
            ));
        }

        // A generator is only consulted when synthesis is on
        let generator = if config.use_llm { self.generator } else { None };
        let splitter = RecursiveSplitter::new(config.sub_chunk_size, config.sub_chunk_overlap);

        tracing::debug!(
            target: "agent",
            "agent ready (use_llm={}, similarity_threshold={})",
            config.use_llm,
            config.similarity_threshold
        );

        Ok(RetrievalAgent {
            source,
            config,
            generator,
            splitter,
        })
    }
}

impl RetrievalAgent {
    pub fn builder() -> RetrievalAgentBuilder {
        RetrievalAgentBuilder::default()
    }

    /// Build an agent from loaded settings.
    ///
    /// With `retrieval.use_llm` set, a Gemini client is created and the
    /// credential variable must be present.
    pub fn from_settings(
        settings: &Settings,
        source: Arc<dyn CandidateSource>,
    ) -> Result<Self, AgentError> {
        RetrievalAgentBuilder::from_settings(settings)?
            .source(source)
            .build()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Candidates within the similarity threshold, in source order.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Candidate>, AgentError> {
        if top_k == 0 {
            return Err(AgentError::InvalidParameter(
                "top_k must be at least 1".into(),
            ));
        }

        let candidates = self.source.candidates(query, top_k)?;
        let total = candidates.len();
        let kept: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| c.distance <= self.config.similarity_threshold)
            .collect();

        tracing::debug!(
            target: "agent",
            "{} of {total} candidate(s) within threshold {}",
            kept.len(),
            self.config.similarity_threshold
        );
        Ok(kept)
    }

    /// Answer a query with up to `n_best` distinct retrieved passages.
    ///
    /// Returns exactly `n_best` entries (padded with placeholders), plus a
    /// synthesized entry first when synthesis is enabled. When nothing passes
    /// the threshold the result is a single "no documents" entry.
    pub async fn answer(
        &self,
        query: &str,
        top_k: usize,
        n_best: usize,
    ) -> Result<Vec<AnsweredResult>, AgentError> {
        if n_best == 0 {
            return Err(AgentError::InvalidParameter(
                "n_best must be at least 1".into(),
            ));
        }

        let mut candidates = self.retrieve(query, top_k)?;
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        if candidates.is_empty() {
            tracing::debug!(target: "agent", "no relevant documents for query");
            return Ok(vec![AnsweredResult::no_documents()]);
        }

        let mut results = self.select_passages(&candidates, n_best);
        let retrieved = results.len();
        results.resize_with(n_best, AnsweredResult::exhausted);

        tracing::debug!(
            target: "agent",
            "selected {retrieved} passage(s) from {} candidate(s), {} padding",
            candidates.len(),
            n_best - retrieved
        );

        if let Some(generator) = &self.generator {
            let context = results
                .iter()
                .filter(|r| r.is_retrieved())
                .map(|r| r.answer.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let prompt = build_prompt(&context, query);

            let text = generator.generate(&prompt).await?;
            tracing::debug!(
                target: "agent",
                "synthesized {} chars with {} ({})",
                text.len(),
                generator.provider(),
                generator.model()
            );
            results.insert(
                0,
                AnsweredResult::synthesized(text, generator.provider(), generator.model()),
            );
            results.truncate(n_best + 1);
        } else {
            results.truncate(n_best);
        }

        Ok(results)
    }

    /// Distinct sub-chunks in rank order, at most `n_best`.
    fn select_passages(&self, candidates: &[Candidate], n_best: usize) -> Vec<AnsweredResult> {
        let mut results = Vec::with_capacity(n_best);
        let mut seen: HashSet<String> = HashSet::new();

        'candidates: for candidate in candidates {
            let pieces = self.splitter.split(candidate.document.trim());
            for (i, piece) in pieces.iter().enumerate() {
                let text = piece.trim();
                if !seen.insert(text.to_string()) {
                    continue;
                }

                results.push(AnsweredResult::retrieved(
                    text,
                    &candidate.metadata.source,
                    candidate.metadata.chunk_index,
                    i,
                    candidate.distance,
                ));

                if results.len() >= n_best {
                    break 'candidates;
                }
            }
        }

        results
    }
}

/// Prompt restricting the model to the retrieved context.
pub fn build_prompt(context: &str, query: &str) -> String {
    format!("Answer the question based only on this context:\n{context}\n\nQ: {query}\nA:")
}
