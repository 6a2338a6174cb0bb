//! Sift Providers - concrete collaborators for the cleaning pipeline
//!
//! - [`OllamaEmbedder`]: text embeddings from a local Ollama server
//! - [`OpenAICompatibleCleaner`]: grammar cleanup via any OpenAI-compatible
//!   chat-completions API (Groq by default)
//!
//! Both are configured from the environment through [`ProviderConfig`].

pub mod config;
pub mod ollama;
pub mod openai_compatible;

pub use config::ProviderConfig;
pub use ollama::OllamaEmbedder;
pub use openai_compatible::OpenAICompatibleCleaner;

use anyhow::Result;
use sift_core::{EmbeddingClient, MessageCleaner};
use std::sync::Arc;

/// Collaborators ready to hand to a `ConversationProcessor`
#[derive(Debug, Clone)]
pub struct Providers {
    /// Embedding collaborator
    pub embedder: Arc<dyn EmbeddingClient>,
    /// Message cleaning collaborator
    pub cleaner: Arc<dyn MessageCleaner>,
}

impl Providers {
    /// Build both clients from provider settings
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let embedder = OllamaEmbedder::from_config(config)?;
        let cleaner = OpenAICompatibleCleaner::from_config(config)?;

        tracing::info!(
            embed_model = %embedder.model(),
            cleaner_model = %config.cleaner_model,
            "Configured providers"
        );

        Ok(Self {
            embedder: Arc::new(embedder),
            cleaner: Arc::new(cleaner),
        })
    }

    /// Build both clients from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(&ProviderConfig::from_env()?)
    }
}
