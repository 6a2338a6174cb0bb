//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ResultExt, SiftError};

/// Default minimum cosine similarity for keeping a tool chunk
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.7;

/// Default context budget, in characters
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 4096;

/// Default delimiter between tool output chunks
pub const DEFAULT_CHUNK_SEPARATOR: &str = "\n\n";

/// Message used when no tool chunk is relevant
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found.";

/// What to do with unprocessed entries found before the processed history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterleavedPolicy {
    /// Clean the stray entries along with the unprocessed suffix
    #[default]
    Repair,

    /// Refuse the conversation
    Reject,
}

/// Configuration for a cleaning pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// Tool chunks must score strictly above this to be kept
    pub score_threshold: f32,

    /// Character budget for the overarching context string
    pub max_context_chars: usize,

    /// Delimiter used to split tool output into chunks
    pub chunk_separator: String,

    /// Replacement for tool output with no relevant chunk
    pub fallback_message: String,

    /// Memoize embeddings for the duration of one pass
    pub cache_embeddings: bool,

    /// Handling of out-of-order `processed` flags
    pub interleaved: InterleavedPolicy,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            chunk_separator: DEFAULT_CHUNK_SEPARATOR.to_string(),
            fallback_message: NO_RELEVANT_INFORMATION.to_string(),
            cache_embeddings: true,
            interleaved: InterleavedPolicy::Repair,
        }
    }
}

impl SiftConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the score threshold
    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = threshold;
        self
    }

    /// Set the context budget
    pub fn with_max_context_chars(mut self, max_chars: usize) -> Self {
        self.max_context_chars = max_chars;
        self
    }

    /// Set the chunk separator
    pub fn with_chunk_separator(mut self, separator: impl Into<String>) -> Self {
        self.chunk_separator = separator.into();
        self
    }

    /// Set the fallback message
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Enable or disable the per-pass embedding cache
    pub fn with_cache_embeddings(mut self, enabled: bool) -> Self {
        self.cache_embeddings = enabled;
        self
    }

    /// Set the interleaving policy
    pub fn with_interleaved(mut self, policy: InterleavedPolicy) -> Self {
        self.interleaved = policy;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.score_threshold) {
            return Err(SiftError::InvalidConfig(format!(
                "score_threshold must be within [-1, 1], got {}",
                self.score_threshold
            )));
        }
        if self.max_context_chars == 0 {
            return Err(SiftError::InvalidConfig(
                "max_context_chars must be greater than zero".to_string(),
            ));
        }
        if self.chunk_separator.is_empty() {
            return Err(SiftError::InvalidConfig(
                "chunk_separator must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(SiftError::from)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load config {}", path.display()))
    }
}
