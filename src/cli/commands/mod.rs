//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod ask;
pub mod index;
pub mod init;
pub mod stats;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Settings;
use crate::store::VectorStoreGateway;
use crate::vector::FastEmbedGenerator;

/// Load the embedding model and open the configured vector store.
pub fn open_gateway(settings: &Settings) -> Result<VectorStoreGateway> {
    let generator = FastEmbedGenerator::from_settings(&settings.embedding)
        .context("Failed to create embedding generator")?;
    VectorStoreGateway::from_settings(settings, Arc::new(generator)).with_context(|| {
        format!(
            "Failed to open vector store at {}",
            settings.index_path.display()
        )
    })
}
