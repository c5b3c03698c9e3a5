//! qembed embeddings - Native Qwen3-Embedding inference.
//!
//! This crate wraps the Qwen3-Embedding-0.6B checkpoint behind a small API:
//! input preparation (prefix and retrieval instruction), a forward pass through
//! candle, attention-masked mean pooling, L2 normalization and Matryoshka (MRL)
//! truncation to a shorter prefix of the vector.
//!
//! # Features
//!
//! - **Native inference**: pure Rust using Candle, no Python runtime
//! - **CPU and GPU support**: CPU by default, optional CUDA/Metal acceleration
//! - **Hub or local weights**: load from a directory or a Hugging Face repo id
//!
//! # Usage
//!
//! ```rust,no_run
//! use qembed_embeddings::{prepare_input, truncate, Instruction, ModelSource, QwenEmbedder};
//!
//! let model = QwenEmbedder::load(&ModelSource::default())?;
//!
//! let text = prepare_input("how do I reset my password?", None, Some(Instruction::Query));
//! let embedding = model.embed_one(&text)?;
//! assert_eq!(embedding.len(), 1024);
//!
//! // Keep only the leading 256 components
//! let short = truncate(embedding, Some(256));
//! assert_eq!(short.len(), 256);
//! # Ok::<(), qembed_embeddings::EmbeddingError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod dimensions;
mod error;
mod instruction;
mod model;
mod pooling;
mod similarity;
mod tokenizer;

pub use dimensions::{mrl_applied, truncate, validate_dimensions};
pub use error::{EmbeddingError, Result};
pub use instruction::{prepare_input, Instruction};
pub use model::{ModelConfig, ModelSource, QwenEmbedder};
pub use pooling::{l2_normalize, mean_pool};
pub use similarity::{cosine_similarity, similarity_matrix};
pub use tokenizer::{EncodedInput, QwenTokenizer};

/// Full embedding dimension of Qwen3-Embedding-0.6B.
pub const DEFAULT_EMBEDDING_DIM: usize = 1024;

/// Smallest MRL dimension the model is trained to support.
pub const MIN_EMBEDDING_DIM: usize = 32;

/// Maximum sequence length (in tokens) fed to the model.
pub const MAX_SEQUENCE_LENGTH: usize = 32768;

/// Display name reported by the service.
pub const MODEL_NAME: &str = "Qwen3-Embedding-0.6B";

/// Hugging Face repository the weights are fetched from by default.
pub const MODEL_REPO: &str = "Qwen/Qwen3-Embedding-0.6B";
