//! Configuration types for document chunking.

use serde::{Deserialize, Serialize};

/// Configuration for document chunking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters. A single longer sentence is kept whole.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between adjacent chunks in characters (used by [`OverlapPolicy::Carry`]).
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// How overlap is realized between adjacent chunks.
    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    50
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            overlap_policy: OverlapPolicy::default(),
        }
    }
}

impl ChunkingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than zero".to_string());
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }

        Ok(())
    }
}

/// How the chunker carries content from one chunk into the next.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Adjacent chunks share nothing; `chunk_overlap` is accepted but unused.
    #[default]
    None,
    /// The tail of the previous chunk (about `chunk_overlap` characters, cut at a
    /// word boundary) seeds the next chunk when it fits within `chunk_size`.
    Carry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_config_defaults() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.overlap_policy, OverlapPolicy::None);
    }

    #[test]
    fn test_chunking_config_validation() {
        let mut config = ChunkingConfig::default();
        assert!(config.validate().is_ok());

        // Invalid: overlap >= size
        config.chunk_overlap = 1000;
        assert!(config.validate().is_err());

        // Invalid: zero size
        config.chunk_size = 0;
        config.chunk_overlap = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlap_policy_serde() {
        let config: ChunkingConfig = toml::from_str("overlap_policy = \"carry\"").unwrap();
        assert_eq!(config.overlap_policy, OverlapPolicy::Carry);
        assert_eq!(config.chunk_size, 1000);
    }
}
