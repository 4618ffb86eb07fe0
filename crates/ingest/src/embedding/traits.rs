use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::retry::Transient;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding backend returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Embedding request timed out after {0:?}")]
    Timeout(Duration),
}

impl Transient for EmbeddingError {
    fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            EmbeddingError::Api { status, .. } => *status == 429 || *status >= 500,
            EmbeddingError::Timeout(_) => true,
            EmbeddingError::DimensionMismatch { .. } | EmbeddingError::CountMismatch { .. } => false,
        }
    }

    fn timed_out(after: Duration) -> Self {
        EmbeddingError::Timeout(after)
    }
}

/// Trait for embedding backends (Ollama, OpenAI-compatible, test fakes).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input text (in order).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Width of the output vectors: the configured one, or the width of the
    /// first response. `None` until either is known.
    fn dimensions(&self) -> Option<usize>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text]).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: vectors.len(),
            });
        }
        Ok(vectors.remove(0))
    }
}

/// Expected vector width. A configured width is enforced from the first
/// call; otherwise the first non-empty response fixes it for the rest of the run.
#[derive(Debug, Default)]
pub struct VectorWidth {
    width: OnceLock<usize>,
}

impl VectorWidth {
    pub fn new(configured: Option<usize>) -> Self {
        let width = OnceLock::new();
        if let Some(configured) = configured {
            let _ = width.set(configured);
        }
        Self { width }
    }

    pub fn get(&self) -> Option<usize> {
        self.width.get().copied()
    }

    /// Check the vector count against `inputs` and every width against the
    /// expected one, learning it from this batch when still unknown.
    pub(crate) fn check(&self, vectors: &[Vec<f32>], inputs: usize) -> Result<(), EmbeddingError> {
        if vectors.len() != inputs {
            return Err(EmbeddingError::CountMismatch {
                expected: inputs,
                actual: vectors.len(),
            });
        }
        let Some(first) = vectors.first() else {
            return Ok(());
        };
        let expected = *self.width.get_or_init(|| first.len());
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }
        Ok(())
    }
}
