//! Error types for Sift Core
//!
//! This module defines all error types used throughout the cleaning pipeline.
//! We use `thiserror` for ergonomic error definitions with automatic Display/Error implementations.

use thiserror::Error;

/// Result type alias for Sift operations
pub type Result<T> = std::result::Result<T, SiftError>;

/// Main error type for Sift operations
#[derive(Error, Debug)]
pub enum SiftError {
    /// An external collaborator failed
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Similarity requested on a zero-norm vector
    #[error("Degenerate vector: {side} embedding has zero norm")]
    DegenerateVector {
        /// Which operand was degenerate ("left" or "right")
        side: &'static str,
    },

    /// Similarity requested on vectors of different lengths
    #[error("Embedding dimension mismatch: {left} vs {right}")]
    DimensionMismatch {
        /// Length of the left operand
        left: usize,
        /// Length of the right operand
        right: usize,
    },

    /// Mean similarity requested against nothing
    #[error("Cannot compute mean similarity against an empty set")]
    EmptyComparisonSet,

    /// The conversation cannot be cleaned as given
    #[error("Malformed conversation: {0}")]
    MalformedConversation(String),

    /// An unprocessed entry sits before the processed history
    #[error("Entry {index} is unprocessed but precedes processed history ending at {boundary}")]
    InterleavedProcessing {
        /// Index of the offending entry
        index: usize,
        /// Start of the trailing unprocessed suffix
        boundary: usize,
    },

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file parse errors
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        /// What was being attempted
        context: String,
        /// Underlying failure
        source: Box<SiftError>,
    },
}

/// Failures reported by the embedding and message-cleaning collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Embedding request failed
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Message cleaning request failed
    #[error("Message cleaning failed: {0}")]
    Cleaning(String),

    /// The service answered without a usable payload
    #[error("Empty response from {0}")]
    EmptyResponse(&'static str),

    /// The service did not answer in time
    #[error("Request timed out after {0}ms")]
    Timeout(u64),
}

impl SiftError {
    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, with every context layer peeled off
    pub fn root_cause(&self) -> &SiftError {
        match self {
            Self::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True when the root cause is a collaborator failure
    pub fn is_service_error(&self) -> bool {
        matches!(self.root_cause(), Self::Service(_))
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}
