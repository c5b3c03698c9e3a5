//! Tokenizer wrapper for Qwen3-Embedding.

use crate::error::{EmbeddingError, Result};
use crate::MAX_SEQUENCE_LENGTH;
use std::path::Path;
use tokenizers::Tokenizer;

/// Wrapper around the HuggingFace tokenizer shipped with the checkpoint.
pub struct QwenTokenizer {
    tokenizer: Tokenizer,
    max_length: usize,
}

/// Encoded input ready for model inference.
#[derive(Debug, Clone)]
pub struct EncodedInput {
    /// Token IDs.
    pub input_ids: Vec<u32>,
    /// Attention mask (1 for real tokens, 0 for padding).
    pub attention_mask: Vec<u32>,
}

impl EncodedInput {
    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// Whether the encoding produced no tokens.
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    fn truncate(&mut self, max_length: usize) {
        self.input_ids.truncate(max_length);
        self.attention_mask.truncate(max_length);
    }
}

impl QwenTokenizer {
    /// Load tokenizer from a `tokenizer.json` path.
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing or cannot be parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EmbeddingError::TokenizerError {
                message: format!("Tokenizer file not found: {}", path.display()),
            });
        }

        let tokenizer = Tokenizer::from_file(path)?;

        Ok(Self {
            tokenizer,
            max_length: MAX_SEQUENCE_LENGTH,
        })
    }

    /// Load tokenizer from an in-memory JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let tokenizer =
            Tokenizer::from_bytes(json.as_bytes()).map_err(|e| EmbeddingError::TokenizerError {
                message: format!("Failed to parse tokenizer JSON: {}", e),
            })?;

        Ok(Self {
            tokenizer,
            max_length: MAX_SEQUENCE_LENGTH,
        })
    }

    /// Set maximum sequence length for tokenization.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Encode a single text, truncating to the maximum sequence length.
    pub fn encode(&self, text: &str) -> Result<EncodedInput> {
        let encoding =
            self.tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizerError {
                    message: format!("Encoding failed: {}", e),
                })?;

        let mut encoded = EncodedInput {
            input_ids: encoding.get_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
        };

        if encoded.len() > self.max_length {
            encoded.truncate(self.max_length);
        }

        Ok(encoded)
    }

    /// Get the vocabulary size.
    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    /// Get the maximum sequence length.
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

/// Minimal word-level tokenizer, enough to exercise the wrapper and a tiny model.
#[cfg(test)]
pub(crate) const TEST_TOKENIZER_JSON: &str = r#"{
    "version": "1.0",
    "truncation": null,
    "padding": null,
    "added_tokens": [],
    "normalizer": null,
    "pre_tokenizer": { "type": "Whitespace" },
    "post_processor": null,
    "decoder": null,
    "model": {
        "type": "WordLevel",
        "vocab": {
            "[UNK]": 0, "the": 1, "quick": 2, "brown": 3, "fox": 4,
            "cats": 5, "purr": 6, "dogs": 7, "bark": 8
        },
        "unk_token": "[UNK]"
    }
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_mask() {
        let tokenizer = QwenTokenizer::from_json(TEST_TOKENIZER_JSON).unwrap();
        let encoded = tokenizer.encode("the quick brown fox").unwrap();

        assert_eq!(encoded.input_ids, vec![1, 2, 3, 4]);
        assert_eq!(encoded.attention_mask, vec![1, 1, 1, 1]);
        assert_eq!(tokenizer.vocab_size(), 9);
    }

    #[test]
    fn test_encode_truncates_to_max_length() {
        let tokenizer = QwenTokenizer::from_json(TEST_TOKENIZER_JSON)
            .unwrap()
            .with_max_length(2);
        let encoded = tokenizer.encode("the quick brown fox jumps").unwrap();

        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded.attention_mask.len(), 2);
        assert_eq!(tokenizer.max_length(), 2);
    }

    #[test]
    fn test_missing_file() {
        let result = QwenTokenizer::from_file("/nonexistent/tokenizer.json");
        assert!(matches!(result, Err(EmbeddingError::TokenizerError { .. })));
    }

    #[test]
    fn test_invalid_json() {
        assert!(QwenTokenizer::from_json("{ not json").is_err());
    }
}
