//! Collaborator interfaces
//!
//! The pipeline depends on two external capabilities: turning text into an
//! embedding vector and rewriting user-authored text. Both are consumed
//! through the traits below; concrete HTTP clients live in `sift-providers`.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ServiceError;

/// Embedding vector produced by an [`EmbeddingClient`]
pub type Embedding = Vec<f32>;

/// Text to vector
#[async_trait]
pub trait EmbeddingClient: Send + Sync + std::fmt::Debug {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Embedding, ServiceError>;
}

/// Text to grammar-corrected text
#[async_trait]
pub trait MessageCleaner: Send + Sync + std::fmt::Debug {
    /// Return the cleaned message, unquoted, meaning preserved
    async fn clean(&self, text: &str) -> Result<String, ServiceError>;
}

#[async_trait]
impl<T: EmbeddingClient + ?Sized> EmbeddingClient for Arc<T> {
    async fn embed(&self, text: &str) -> Result<Embedding, ServiceError> {
        (**self).embed(text).await
    }
}

#[async_trait]
impl<T: MessageCleaner + ?Sized> MessageCleaner for Arc<T> {
    async fn clean(&self, text: &str) -> Result<String, ServiceError> {
        (**self).clean(text).await
    }
}

#[async_trait]
impl<T: EmbeddingClient + ?Sized> EmbeddingClient for &T {
    async fn embed(&self, text: &str) -> Result<Embedding, ServiceError> {
        (**self).embed(text).await
    }
}

#[async_trait]
impl<T: MessageCleaner + ?Sized> MessageCleaner for &T {
    async fn clean(&self, text: &str) -> Result<String, ServiceError> {
        (**self).clean(text).await
    }
}

#[derive(Debug, Default)]
struct CacheState {
    vectors: HashMap<String, Embedding>,
    hits: usize,
    misses: usize,
}

/// Exact-text memo in front of an [`EmbeddingClient`]
///
/// Scoped to a single cleaning pass: the processor creates a fresh cache per
/// call so nothing outlives the request. Failed embeddings are not cached.
#[derive(Debug)]
pub struct EmbeddingCache {
    inner: Arc<dyn EmbeddingClient>,
    state: Mutex<CacheState>,
}

impl EmbeddingCache {
    /// Wrap a client with an empty cache
    pub fn new(inner: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            inner,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Number of lookups answered from the cache
    pub fn hits(&self) -> usize {
        self.state.lock().hits
    }

    /// Number of lookups forwarded to the wrapped client
    pub fn misses(&self) -> usize {
        self.state.lock().misses
    }

    /// Distinct texts held
    pub fn len(&self) -> usize {
        self.state.lock().vectors.len()
    }

    /// True when nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EmbeddingClient for EmbeddingCache {
    async fn embed(&self, text: &str) -> Result<Embedding, ServiceError> {
        {
            let mut state = self.state.lock();
            if let Some(vector) = state.vectors.get(text).cloned() {
                state.hits += 1;
                return Ok(vector);
            }
            state.misses += 1;
        }

        let vector = self.inner.embed(text).await?;
        self.state
            .lock()
            .vectors
            .insert(text.to_string(), vector.clone());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingClient for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Embedding, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.is_empty() {
                return Err(ServiceError::EmptyResponse("counting embedder"));
            }
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    #[tokio::test]
    async fn test_cache_memoizes_exact_text() {
        let inner = Arc::new(CountingEmbedder::default());
        let cache = EmbeddingCache::new(inner.clone());

        let first = cache.embed("payment gateways").await.unwrap();
        let second = cache.embed("payment gateways").await.unwrap();
        cache.embed("shipping").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_does_not_store_failures() {
        let inner = Arc::new(CountingEmbedder::default());
        let cache = EmbeddingCache::new(inner.clone());

        assert!(cache.embed("").await.is_err());
        assert!(cache.embed("").await.is_err());

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_arc_forwarding() {
        let inner: Arc<dyn EmbeddingClient> = Arc::new(CountingEmbedder::default());
        let shared = Arc::new(inner);
        assert_eq!(shared.embed("abc").await.unwrap(), vec![3.0, 1.0]);
    }
}
