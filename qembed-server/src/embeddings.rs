//! Embedding model trait used by the HTTP handlers.
//!
//! Handlers only see `dyn EmbeddingModel`, so the router can be exercised
//! with a lightweight stand-in instead of the real checkpoint.

pub use qembed_embeddings::{EmbeddingError, Result as EmbeddingResult};
use qembed_embeddings::QwenEmbedder;

/// Trait for embedding models that can convert text to vectors.
///
/// # Example
///
/// ```ignore
/// use qembed_server::embeddings::{EmbeddingModel, EmbeddingResult};
///
/// struct MyEmbedder;
///
/// impl EmbeddingModel for MyEmbedder {
///     fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
///         Ok(vec![1.0, 0.0, 0.0])
///     }
///
///     fn dimension(&self) -> usize {
///         3
///     }
///
///     fn model_name(&self) -> &str {
///         "my-embedder"
///     }
/// }
/// ```
pub trait EmbeddingModel: Send + Sync {
    /// Generate a unit-norm embedding for already prepared text.
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Get the dimension of the embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;

    /// Device label reported by `/health`.
    fn device(&self) -> &str {
        "cpu"
    }
}

impl EmbeddingModel for QwenEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.embed_one(text)
    }

    fn dimension(&self) -> usize {
        self.embedding_dim()
    }

    fn model_name(&self) -> &str {
        qembed_embeddings::MODEL_NAME
    }

    fn device(&self) -> &str {
        self.device_name()
    }
}
