//! Text generation over a remote language model.

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from text generation.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} returned no candidates")]
    EmptyResponse { provider: String },
}

/// A language model that completes a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Human-readable provider name, e.g. `Gemini`.
    fn provider(&self) -> &str;

    fn model(&self) -> &str;
}

/// Read a credential from the named environment variable.
///
/// Unset and empty are both treated as missing.
pub fn credential_from_env(var: &str) -> Result<String, LlmError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(LlmError::MissingCredential {
            var: var.to_string(),
        }),
    }
}
