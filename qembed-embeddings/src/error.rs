//! Error types for qembed-embeddings.

use thiserror::Error;

/// Result type alias for qembed-embeddings operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Model directory or file not found at the specified path.
    #[error("Model file not found: {path}")]
    ModelNotFound {
        /// Path that was searched for the model.
        path: String,
    },

    /// Tokenizer file not found or invalid.
    #[error("Tokenizer error: {message}")]
    TokenizerError {
        /// Description of the tokenizer error.
        message: String,
    },

    /// Error loading model weights.
    #[error("Failed to load model weights: {message}")]
    WeightLoadError {
        /// Description of the weight loading error.
        message: String,
    },

    /// Error during model inference.
    #[error("Inference error: {message}")]
    InferenceError {
        /// Description of the inference error.
        message: String,
    },

    /// Invalid model configuration.
    #[error("Invalid model configuration: {message}")]
    ConfigError {
        /// Description of the configuration error.
        message: String,
    },

    /// Empty input provided.
    #[error("Text cannot be empty")]
    EmptyInput,

    /// Requested MRL dimension is outside the supported range.
    #[error("Dimensions must be between 32 and 1024, got {requested}")]
    InvalidDimensions {
        /// Dimension the caller asked for.
        requested: usize,
    },

    /// Instruction role other than `query` or `document`.
    #[error("Unknown instruction '{0}', expected 'query' or 'document'")]
    InvalidInstruction(String),

    /// Failure fetching files from the Hugging Face Hub.
    #[error("Model download failed: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),

    /// IO error reading model files.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error for config files.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Candle tensor operation error.
    #[error("Tensor error: {message}")]
    TensorError {
        /// Description of the tensor error.
        message: String,
    },
}

impl EmbeddingError {
    /// Whether the error was caused by the caller's input rather than the model.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EmbeddingError::EmptyInput
                | EmbeddingError::InvalidDimensions { .. }
                | EmbeddingError::InvalidInstruction(_)
        )
    }
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::TensorError {
            message: err.to_string(),
        }
    }
}

impl From<tokenizers::Error> for EmbeddingError {
    fn from(err: tokenizers::Error) -> Self {
        EmbeddingError::TokenizerError {
            message: err.to_string(),
        }
    }
}
