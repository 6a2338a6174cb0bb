//! Message cleaning through an OpenAI-compatible chat-completions API

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use sift_core::{MessageCleaner, ServiceError};

use crate::config::ProviderConfig;

const CLEANING_PROMPT: &str = "Please clean up the following message by correcting any grammar, \
spelling, and punctuation errors, and improving clarity while preserving the original meaning. \
Return only the cleaned version of the message **without enclosing it in quotes**. \
Here's the message:";

/// Cleaning is a rewrite, not a creative task
const CLEANING_TEMPERATURE: f64 = 0.0;

const MAX_TOKENS: u32 = 2048;

/// Grammar cleanup through any OpenAI-compatible chat-completions API
#[derive(Debug, Clone)]
pub struct OpenAICompatibleCleaner {
    pub name: String,
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl OpenAICompatibleCleaner {
    pub fn new(
        name: impl Into<String>,
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            name: name.into(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
            http_client,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("GROQ_API_KEY is not set; the message cleaner needs an API key")?;

        Self::new(
            "groq",
            Some(api_key),
            &config.cleaner_base_url,
            &config.cleaner_model,
            config.timeout(),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(text),
            }],
            max_tokens: Some(MAX_TOKENS),
            temperature: Some(CLEANING_TEMPERATURE),
        }
    }

    async fn request_completion(&self, text: &str) -> std::result::Result<String, ServiceError> {
        let request = self.build_request(text);

        let mut builder = self
            .http_client
            .post(self.endpoint())
            .header("Content-Type", "application/json");

        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.json(&request).send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Timeout(self.timeout.as_millis() as u64)
            } else {
                ServiceError::Cleaning(format!("Failed to send {} request: {}", self.name, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Cleaning(format!(
                "{} API error ({}): {}",
                self.name, status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            ServiceError::Cleaning(format!("Failed to parse {} response: {}", self.name, e))
        })?;

        if let Some(tokens) = completion.usage.as_ref().and_then(|u| u.total_tokens) {
            tracing::debug!(provider = %self.name, tokens, "Message cleaned");
        }

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ServiceError::EmptyResponse("chat completion"))
    }
}

fn build_prompt(text: &str) -> String {
    format!("{}\n\n{}\n", CLEANING_PROMPT, text)
}

/// Drop whitespace and one pair of wrapping quotes the model added anyway
///
/// Only a pair enclosing the whole message is removed: quotes inside the
/// message mean the outer ones belong to quoted words.
fn strip_wrapping_quotes(content: &str) -> &str {
    let trimmed = content.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”')] {
        let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        else {
            continue;
        };
        if !inner.contains(open) && !inner.contains(close) {
            return inner.trim();
        }
    }
    trimmed
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    total_tokens: Option<u32>,
}

#[async_trait]
impl MessageCleaner for OpenAICompatibleCleaner {
    async fn clean(&self, text: &str) -> std::result::Result<String, ServiceError> {
        let content = self.request_completion(text).await?;
        let cleaned = strip_wrapping_quotes(&content);
        if cleaned.is_empty() {
            return Err(ServiceError::EmptyResponse("chat completion"));
        }
        Ok(cleaned.to_string())
    }
}
