//! Ollama embedding client (local models)

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use sift_core::{Embedding, EmbeddingClient, ServiceError};

use crate::config::ProviderConfig;

/// Embeds text through Ollama's `/api/embed` endpoint
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl OllamaEmbedder {
    /// Create a client for `model` served at `base_url`
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
            http_client,
        })
    }

    /// Create a client from provider settings
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::new(&config.ollama_host, &config.embed_model, config.timeout())
    }

    /// Embedding model name
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }

    async fn request_embedding(&self, text: &str) -> std::result::Result<Embedding, ServiceError> {
        let request = EmbedRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Embedding(format!("Failed to parse Ollama response: {e}")))?;

        first_embedding(body)
    }

    fn transport_error(&self, error: reqwest::Error) -> ServiceError {
        if error.is_timeout() {
            ServiceError::Timeout(self.timeout.as_millis() as u64)
        } else {
            ServiceError::Embedding(format!("Failed to reach Ollama at {}: {}", self.base_url, error))
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

fn first_embedding(body: EmbedResponse) -> std::result::Result<Embedding, ServiceError> {
    let vector = body
        .embeddings
        .into_iter()
        .next()
        .ok_or(ServiceError::EmptyResponse("ollama"))?;

    if vector.is_empty() {
        return Err(ServiceError::EmptyResponse("ollama"));
    }
    Ok(vector)
}

#[async_trait]
impl EmbeddingClient for OllamaEmbedder {
    async fn embed(&self, text: &str) -> std::result::Result<Embedding, ServiceError> {
        let vector = self.request_embedding(text).await?;
        tracing::trace!(model = %self.model, dimension = vector.len(), "Embedded text");
        Ok(vector)
    }
}
