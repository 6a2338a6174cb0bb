//! Cosine similarity between embeddings
//!
//! Zero-norm vectors are a violation of the embedding contract and surface as
//! [`SiftError::DegenerateVector`] instead of producing NaN.

use crate::client::EmbeddingClient;
use crate::error::{Result, SiftError};

/// Cosine similarity: dot(a, b) / (|a| * |b|)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(SiftError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 {
        return Err(SiftError::DegenerateVector { side: "left" });
    }
    if norm_b == 0.0 {
        return Err(SiftError::DegenerateVector { side: "right" });
    }

    Ok(dot / (norm_a * norm_b))
}

/// Arithmetic mean of the cosine similarity between `a` and each of `others`
pub fn mean_similarity<V: AsRef<[f32]>>(a: &[f32], others: &[V]) -> Result<f32> {
    if others.is_empty() {
        return Err(SiftError::EmptyComparisonSet);
    }

    let mut total = 0.0f32;
    for other in others {
        total += cosine_similarity(a, other.as_ref())?;
    }
    Ok(total / others.len() as f32)
}

/// Text-level similarity that embeds its inputs on demand
#[derive(Debug)]
pub struct TextSimilarity<'a, E: EmbeddingClient + ?Sized> {
    embedder: &'a E,
}

impl<'a, E: EmbeddingClient + ?Sized> TextSimilarity<'a, E> {
    /// Score texts with `embedder`
    pub fn new(embedder: &'a E) -> Self {
        Self { embedder }
    }

    /// Cosine similarity between two texts
    pub async fn similarity(&self, text_a: &str, text_b: &str) -> Result<f32> {
        let a = self.embedder.embed(text_a).await?;
        let b = self.embedder.embed(text_b).await?;
        cosine_similarity(&a, &b)
    }

    /// Mean similarity between `text_a` and every text in `texts_b`
    ///
    /// `text_a` is embedded once regardless of how many comparisons follow.
    pub async fn mean_similarity<S: AsRef<str>>(&self, text_a: &str, texts_b: &[S]) -> Result<f32> {
        if texts_b.is_empty() {
            return Err(SiftError::EmptyComparisonSet);
        }

        let a = self.embedder.embed(text_a).await?;
        let mut others = Vec::with_capacity(texts_b.len());
        for text in texts_b {
            others.push(self.embedder.embed(text.as_ref()).await?);
        }
        mean_similarity(&a, &others)
    }
}
