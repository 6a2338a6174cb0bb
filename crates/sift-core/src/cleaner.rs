//! Per-entry cleaning policy
//!
//! | role     | transform                                   |
//! |----------|---------------------------------------------|
//! | `user`   | rewritten by the [`MessageCleaner`]         |
//! | `ai`     | unchanged                                   |
//! | `system` | unchanged                                   |
//! | `tool`   | chunks kept only if relevant to the context |
//! | other    | unchanged                                   |
//!
//! Every cleaned entry comes back with `processed = true`.

use crate::client::{EmbeddingClient, MessageCleaner};
use crate::config::SiftConfig;
use crate::context::ContextBuilder;
use crate::conversation::{ConversationEntry, Role};
use crate::error::{Result, ResultExt, SiftError};
use crate::similarity::cosine_similarity;

/// Applies the role policy to single entries
#[derive(Debug)]
pub struct EntryCleaner<'a> {
    embedder: &'a dyn EmbeddingClient,
    cleaner: &'a dyn MessageCleaner,
    config: &'a SiftConfig,
    context: ContextBuilder,
}

impl<'a> EntryCleaner<'a> {
    /// Create a cleaner over the given collaborators
    pub fn new(
        embedder: &'a dyn EmbeddingClient,
        cleaner: &'a dyn MessageCleaner,
        config: &'a SiftConfig,
    ) -> Self {
        Self {
            embedder,
            cleaner,
            config,
            context: ContextBuilder::new(config.max_context_chars),
        }
    }

    /// Return a processed copy of `entry`
    ///
    /// `conversation` is the history as it stands when the entry is cleaned;
    /// only its processed entries feed the overarching context.
    pub async fn clean_entry(
        &self,
        entry: &ConversationEntry,
        conversation: &[ConversationEntry],
        original_task: &str,
    ) -> Result<ConversationEntry> {
        let message = match &entry.role {
            Role::User => self
                .cleaner
                .clean(&entry.message)
                .await
                .map_err(SiftError::from)
                .context("Failed to clean user message")?,
            Role::Tool => {
                self.filter_tool_output(&entry.message, conversation, original_task)
                    .await?
            }
            Role::Ai | Role::System | Role::Other(_) => entry.message.clone(),
        };

        Ok(entry.with_cleaned_message(message))
    }

    /// Keep only the chunks of `message` that relate to the overarching context
    ///
    /// Kept chunks are concatenated without a separator. When nothing scores
    /// strictly above the threshold the configured fallback is returned.
    pub async fn filter_tool_output(
        &self,
        message: &str,
        conversation: &[ConversationEntry],
        original_task: &str,
    ) -> Result<String> {
        let context_vector = self
            .context
            .build(self.embedder, original_task, conversation)
            .await?;

        let mut kept = String::new();
        let mut kept_chunks = 0usize;
        let mut total_chunks = 0usize;

        for chunk in message.split(self.config.chunk_separator.as_str()) {
            total_chunks += 1;
            let chunk_vector = self
                .embedder
                .embed(chunk)
                .await
                .map_err(SiftError::from)
                .context("Failed to embed tool chunk")?;
            let score = cosine_similarity(&chunk_vector, &context_vector)?;

            tracing::debug!(score, threshold = self.config.score_threshold, "Scored tool chunk");

            if score > self.config.score_threshold {
                kept.push_str(chunk);
                kept_chunks += 1;
            }
        }

        tracing::debug!(kept_chunks, total_chunks, "Filtered tool output");

        if kept.is_empty() {
            return Ok(self.config.fallback_message.clone());
        }
        Ok(kept)
    }
}
