//! # Overarching context
//!
//! Folds the already-processed history into one bounded string, newest
//! entries nearest the task, and embeds it. New tool output is scored against
//! that vector.
//!
//! ```text
//!   processed[0] \n processed[1] \n ... processed[n] \n task \n
//!   └──────── prepended while scanning backward ───────┘
//! ```
//!
//! The budget is a character count, not a tokenizer. When it is exceeded the
//! string is hard-cut to its first `max_chars` characters and scanning stops.

use std::collections::VecDeque;

use crate::client::{Embedding, EmbeddingClient};
use crate::config::DEFAULT_MAX_CONTEXT_CHARS;
use crate::conversation::ConversationEntry;
use crate::error::{Result, ResultExt, SiftError};

/// Builds the context string and vector for a conversation
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder {
    max_chars: usize,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXT_CHARS)
    }
}

impl ContextBuilder {
    /// Builder with a character budget
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Character budget
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Assemble the bounded context string
    pub fn build_text(&self, task: &str, entries: &[ConversationEntry]) -> String {
        let mut pieces: VecDeque<&str> = VecDeque::new();
        pieces.push_back(task);
        pieces.push_back("\n");
        let mut chars = task.chars().count() + 1;

        for entry in entries.iter().rev() {
            if entry.processed {
                pieces.push_front("\n");
                pieces.push_front(&entry.message);
                chars += entry.message.chars().count() + 1;
            }
            if chars > self.max_chars {
                break;
            }
        }

        let mut context = String::with_capacity(pieces.iter().map(|p| p.len()).sum());
        for piece in pieces {
            context.push_str(piece);
        }
        truncate_chars(&mut context, self.max_chars);
        context
    }

    /// Assemble the context string and embed it
    pub async fn build<E>(&self, embedder: &E, task: &str, entries: &[ConversationEntry]) -> Result<Embedding>
    where
        E: EmbeddingClient + ?Sized,
    {
        let context = self.build_text(task, entries);
        tracing::debug!(chars = context.chars().count(), "Embedding overarching context");

        embedder
            .embed(&context)
            .await
            .map_err(SiftError::from)
            .context("Failed to embed overarching context")
    }
}

/// Cut `text` to its first `max_chars` characters, on a char boundary
fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((byte_index, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_index);
    }
}
