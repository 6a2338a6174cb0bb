//! Sift Core - incremental conversation cleaning under a context budget
//!
//! Sift takes a growing multi-turn conversation (a task plus turns tagged
//! `user`, `ai`, `system` or `tool`) and cleans the part that has not been
//! processed yet. User turns are rewritten by a message cleaner, tool output is
//! reduced to the chunks that relate to what the conversation is about, and
//! already-processed turns are never touched again.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │           ConversationProcessor              │
//! │  - original task, unprocessed suffix         │
//! │  - atomic pass, per-pass embedding cache     │
//! └──────────────────────────────────────────────┘
//!                      │
//!               ┌──────┴──────┐
//!               │ EntryCleaner│── MessageCleaner (user)
//!               └──────┬──────┘
//!          ┌───────────┴───────────┐
//!   ┌──────┴───────┐        ┌──────┴───────┐
//!   │ContextBuilder│        │  similarity  │
//!   └──────┬───────┘        └──────────────┘
//!          └──── EmbeddingClient
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use sift_core::{
//!     Conversation, ConversationEntry, ConversationProcessor, Embedding, EmbeddingClient,
//!     MessageCleaner, ServiceError,
//! };
//!
//! #[derive(Debug)]
//! struct Flat;
//!
//! #[async_trait]
//! impl EmbeddingClient for Flat {
//!     async fn embed(&self, _text: &str) -> Result<Embedding, ServiceError> {
//!         Ok(vec![1.0, 0.0])
//!     }
//! }
//!
//! #[async_trait]
//! impl MessageCleaner for Flat {
//!     async fn clean(&self, text: &str) -> Result<String, ServiceError> {
//!         Ok(text.trim().to_string())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let processor = ConversationProcessor::new(Arc::new(Flat), Arc::new(Flat));
//!
//! let mut conversation = Conversation::new();
//! conversation.push(ConversationEntry::user("  integrate paypal  "));
//! conversation.push(ConversationEntry::tool("PayPal SDK docs\n\nUnrelated banner"));
//!
//! let cleaned = processor.clean_conversation(&conversation).await.unwrap();
//! assert_eq!(cleaned[0].message, "integrate paypal");
//! assert!(cleaned.is_fully_processed());
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod cleaner;
pub mod client;
pub mod config;
pub mod context;
pub mod conversation;
pub mod error;
pub mod processor;
pub mod similarity;

// Re-export commonly used types for convenience
pub use cleaner::EntryCleaner;
pub use client::{Embedding, EmbeddingCache, EmbeddingClient, MessageCleaner};
pub use config::{InterleavedPolicy, SiftConfig, NO_RELEVANT_INFORMATION};
pub use context::ContextBuilder;
pub use conversation::{CleanReport, Conversation, ConversationEntry, Role};
pub use error::{Result, ResultExt, ServiceError, SiftError};
pub use processor::ConversationProcessor;
pub use similarity::{cosine_similarity, mean_similarity, TextSimilarity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
