//! Ask command - answer a question from the indexed documents.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::sync::Arc;

use crate::agent::{AnsweredResult, RetrievalAgentBuilder};
use crate::config::Settings;
use crate::store::CandidateSource;

/// Per-invocation overrides of the `[retrieval]` settings.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AskOverrides {
    pub top_k: Option<usize>,
    pub n_best: Option<usize>,
    pub threshold: Option<f32>,
    pub use_llm: bool,
}

impl AskOverrides {
    /// Settings with the overrides applied. `use_llm` can only switch synthesis on.
    pub fn apply(&self, settings: &Settings) -> Settings {
        let mut settings = settings.clone();
        let retrieval = &mut settings.retrieval;
        if let Some(top_k) = self.top_k {
            retrieval.top_k = top_k;
        }
        if let Some(n_best) = self.n_best {
            retrieval.n_best = n_best;
        }
        if let Some(threshold) = self.threshold {
            retrieval.similarity_threshold = threshold;
        }
        retrieval.use_llm |= self.use_llm;
        settings
    }
}

/// Human-readable rendering of an answer list.
pub fn render(results: &[AnsweredResult]) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        let source = result.source.as_deref().unwrap_or("Unknown");
        let distance = result
            .distance
            .map_or_else(|| "N/A".to_string(), |d| format!("{d:.4}"));

        let _ = writeln!(out, "Response {}", i + 1);
        let _ = writeln!(out, "{}", result.answer);
        let _ = writeln!(out, "Source: {source} | Distance: {distance}");
        if let Some(reason) = &result.reason {
            let _ = writeln!(out, "{reason}");
        }
        let _ = writeln!(out, "{}", "-".repeat(50));
    }
    out
}

/// Run ask command.
///
/// `open_source` is called only after the agent settings (and the LLM
/// credential, when synthesis is on) have been checked.
pub async fn run<F>(
    settings: &Settings,
    open_source: F,
    query: &str,
    overrides: &AskOverrides,
    json: bool,
) -> Result<()>
where
    F: FnOnce(&Settings) -> Result<Arc<dyn CandidateSource>>,
{
    let settings = overrides.apply(settings);
    let builder = RetrievalAgentBuilder::from_settings(&settings)
        .context("Failed to create retrieval agent")?;
    let agent = builder
        .source(open_source(&settings)?)
        .build()
        .context("Failed to create retrieval agent")?;

    let results = agent
        .answer(query, settings.retrieval.top_k, settings.retrieval.n_best)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", render(&results));
    }
    Ok(())
}
