//! Deterministic collaborators for pipeline tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use sift_core::{Embedding, EmbeddingClient, MessageCleaner, ServiceError};
use std::collections::HashMap;

/// Fixed vector per known text, `default` for anything else; records every call
#[derive(Debug)]
pub struct TableEmbedder {
    table: HashMap<String, Embedding>,
    default: Embedding,
    calls: Mutex<Vec<String>>,
}

impl TableEmbedder {
    pub fn new(default: Embedding) -> Self {
        Self {
            table: HashMap::new(),
            default,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, text: &str, vector: Embedding) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Recorded texts that were not table keys, i.e. context strings
    pub fn context_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|text| !self.table.contains_key(text.as_str()))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EmbeddingClient for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, ServiceError> {
        self.calls.lock().push(text.to_string());
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}

/// Succeeds `budget` times, then fails every call
#[derive(Debug)]
pub struct FlakyEmbedder {
    remaining: Mutex<usize>,
}

impl FlakyEmbedder {
    pub fn new(budget: usize) -> Self {
        Self {
            remaining: Mutex::new(budget),
        }
    }
}

#[async_trait]
impl EmbeddingClient for FlakyEmbedder {
    async fn embed(&self, _text: &str) -> Result<Embedding, ServiceError> {
        let mut remaining = self.remaining.lock();
        if *remaining == 0 {
            return Err(ServiceError::Embedding("connection reset".to_string()));
        }
        *remaining -= 1;
        Ok(vec![1.0, 0.0, 0.0])
    }
}

/// Prefixes messages with `clean: ` and records its inputs
#[derive(Debug, Default)]
pub struct RecordingCleaner {
    inputs: Mutex<Vec<String>>,
}

impl RecordingCleaner {
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl MessageCleaner for RecordingCleaner {
    async fn clean(&self, text: &str) -> Result<String, ServiceError> {
        self.inputs.lock().push(text.to_string());
        Ok(format!("clean: {text}"))
    }
}
