//! # Conversation processor
//!
//! Incrementally cleans a growing conversation. Each pass:
//!
//! 1. cleans the original task (the first `user` entry) if it is still raw,
//! 2. finds the trailing run of unprocessed entries by scanning backward until
//!    the first processed entry,
//! 3. cleans that run oldest to newest, so every cleaned entry is already part
//!    of the history the next entry's context is built from.
//!
//! A pass works on a private copy and only hands it back when every entry
//! succeeded; a failing collaborator leaves the caller's conversation as it
//! was.

use std::sync::Arc;

use crate::cleaner::EntryCleaner;
use crate::client::{EmbeddingCache, EmbeddingClient, MessageCleaner};
use crate::config::{InterleavedPolicy, SiftConfig};
use crate::conversation::{CleanReport, Conversation};
use crate::error::{Result, ResultExt, SiftError};

/// Drives cleaning passes over whole conversations
#[derive(Debug, Clone)]
pub struct ConversationProcessor {
    embedder: Arc<dyn EmbeddingClient>,
    cleaner: Arc<dyn MessageCleaner>,
    config: SiftConfig,
}

impl ConversationProcessor {
    /// Processor with the default configuration
    pub fn new(embedder: Arc<dyn EmbeddingClient>, cleaner: Arc<dyn MessageCleaner>) -> Self {
        Self {
            embedder,
            cleaner,
            config: SiftConfig::default(),
        }
    }

    /// Processor with a validated configuration
    pub fn with_config(
        embedder: Arc<dyn EmbeddingClient>,
        cleaner: Arc<dyn MessageCleaner>,
        config: SiftConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            embedder,
            cleaner,
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Clean the unprocessed part of `conversation` and return the result
    ///
    /// The input is never modified.
    pub async fn clean_conversation(&self, conversation: &Conversation) -> Result<Conversation> {
        let (cleaned, _) = self.run_pass(conversation).await?;
        Ok(cleaned)
    }

    /// Clean `conversation` in place, committing only if the whole pass succeeds
    pub async fn clean_in_place(&self, conversation: &mut Conversation) -> Result<CleanReport> {
        let (cleaned, report) = self.run_pass(conversation).await?;
        *conversation = cleaned;
        Ok(report)
    }

    async fn run_pass(&self, conversation: &Conversation) -> Result<(Conversation, CleanReport)> {
        let mut report = CleanReport::default();
        if conversation.is_empty() {
            return Ok((Conversation::new(), report));
        }

        let cache = self
            .config
            .cache_embeddings
            .then(|| EmbeddingCache::new(self.embedder.clone()));
        let embedder: &dyn EmbeddingClient = match &cache {
            Some(cache) => cache,
            None => self.embedder.as_ref(),
        };

        let mut working = conversation.clone();

        let task_index = working.original_task_index().ok_or_else(|| {
            SiftError::MalformedConversation(
                "no user entry to take the original task from".to_string(),
            )
        })?;

        if !working[task_index].processed {
            let cleaned = self
                .cleaner
                .clean(&working[task_index].message)
                .await
                .map_err(SiftError::from)
                .context("Failed to clean original task")?;
            let task_entry = working[task_index].with_cleaned_message(cleaned);
            working.replace(task_index, task_entry);
            report.task_cleaned = true;
        }
        let original_task = working[task_index].message.clone();

        let boundary = working.unprocessed_boundary();
        let stray = working.out_of_order(boundary);
        if let Some(&first) = stray.first() {
            match self.config.interleaved {
                InterleavedPolicy::Reject => {
                    return Err(SiftError::InterleavedProcessing {
                        index: first,
                        boundary,
                    });
                }
                InterleavedPolicy::Repair => {
                    tracing::warn!(
                        ?stray,
                        boundary,
                        "Unprocessed entries precede processed history; cleaning them with the suffix"
                    );
                    report.repaired = stray.clone();
                }
            }
        }

        let pending: Vec<usize> = stray.into_iter().chain(boundary..working.len()).collect();
        tracing::debug!(task_index, boundary, pending = pending.len(), "Starting cleaning pass");

        let entry_cleaner = EntryCleaner::new(embedder, self.cleaner.as_ref(), &self.config);
        for index in pending {
            let cleaned = entry_cleaner
                .clean_entry(&working[index], working.entries(), &original_task)
                .await
                .with_context(|| format!("Failed to clean entry {index}"))?;
            tracing::debug!(index, role = %cleaned.role, "Cleaned entry");
            working.replace(index, cleaned);
            report.cleaned.push(index);
        }

        if let Some(cache) = &cache {
            tracing::debug!(hits = cache.hits(), misses = cache.misses(), "Embedding cache usage");
        }
        tracing::info!(
            task_cleaned = report.task_cleaned,
            cleaned = report.cleaned.len(),
            repaired = report.repaired.len(),
            "Cleaning pass complete"
        );

        Ok((working, report))
    }
}
