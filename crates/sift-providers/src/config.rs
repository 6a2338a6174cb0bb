//! Provider configuration from the environment

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

/// Default Ollama endpoint
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Default embedding model
pub const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";

/// Default OpenAI-compatible endpoint (Groq)
pub const DEFAULT_CLEANER_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default message cleaning model
pub const DEFAULT_CLEANER_MODEL: &str = "llama-3.1-8b-instant";

/// Connection settings for both collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the Ollama server
    pub ollama_host: String,

    /// Ollama embedding model
    pub embed_model: String,

    /// Base URL of the chat-completions API
    pub cleaner_base_url: String,

    /// Chat model used for cleaning
    pub cleaner_model: String,

    /// Bearer token for the chat-completions API
    pub api_key: Option<String>,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            cleaner_base_url: DEFAULT_CLEANER_BASE_URL.to_string(),
            cleaner_model: DEFAULT_CLEANER_MODEL.to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl ProviderConfig {
    /// Read settings from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = match non_empty("SIFT_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("SIFT_TIMEOUT_SECS is not a number: {raw}"))?,
            None => defaults.timeout_secs,
        };
        if timeout_secs == 0 {
            return Err(anyhow!("SIFT_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(Self {
            ollama_host: non_empty("OLLAMA_HOST").unwrap_or(defaults.ollama_host),
            embed_model: non_empty("SIFT_EMBED_MODEL").unwrap_or(defaults.embed_model),
            cleaner_base_url: non_empty("SIFT_CLEANER_BASE_URL")
                .unwrap_or(defaults.cleaner_base_url),
            cleaner_model: non_empty("SIFT_CLEANER_MODEL").unwrap_or(defaults.cleaner_model),
            api_key: non_empty("GROQ_API_KEY").or_else(|| non_empty("API_KEY_GROQ")),
            timeout_secs,
        })
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
