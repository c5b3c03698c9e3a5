//! Qwen3-based model for embedding generation.

use crate::error::{EmbeddingError, Result};
use crate::pooling::{l2_normalize, mean_pool};
use crate::tokenizer::{EncodedInput, QwenTokenizer};
use crate::{DEFAULT_EMBEDDING_DIM, MAX_SEQUENCE_LENGTH, MODEL_REPO};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::qwen3::{Config as Qwen3Config, Model as Qwen3Model};
use hf_hub::api::sync::Api;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix candle's Qwen3 implementation expects on every weight name.
const WEIGHT_PREFIX: &str = "model.";

/// Metadata subset of the checkpoint's `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Hidden size (embedding dimension).
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
    /// Number of hidden layers.
    #[serde(default = "default_num_hidden_layers")]
    pub num_hidden_layers: usize,
    /// Vocabulary size.
    #[serde(default = "default_vocab_size")]
    pub vocab_size: usize,
    /// Maximum position embeddings (context length).
    #[serde(default = "default_max_position_embeddings")]
    pub max_position_embeddings: usize,
    /// Architecture family, `qwen3` for supported checkpoints.
    #[serde(default)]
    pub model_type: Option<String>,
}

fn default_hidden_size() -> usize {
    DEFAULT_EMBEDDING_DIM
}

fn default_num_hidden_layers() -> usize {
    28
}

fn default_vocab_size() -> usize {
    151669
}

fn default_max_position_embeddings() -> usize {
    MAX_SEQUENCE_LENGTH
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_size: default_hidden_size(),
            num_hidden_layers: default_num_hidden_layers(),
            vocab_size: default_vocab_size(),
            max_position_embeddings: default_max_position_embeddings(),
            model_type: Some("qwen3".to_string()),
        }
    }
}

impl ModelConfig {
    /// Parse configuration from the contents of `config.json`.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        if let Some(model_type) = &config.model_type {
            if model_type != "qwen3" {
                return Err(EmbeddingError::ConfigError {
                    message: format!("Unsupported model_type '{}', expected 'qwen3'", model_type),
                });
            }
        }
        Ok(config)
    }
}

/// Where the checkpoint files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Directory holding `config.json`, `tokenizer.json` and `model.safetensors`.
    Local(PathBuf),
    /// Hugging Face Hub repository id, fetched into the local hub cache.
    Hub(String),
}

impl Default for ModelSource {
    fn default() -> Self {
        ModelSource::Hub(MODEL_REPO.to_string())
    }
}

impl ModelSource {
    /// Interpret a user-supplied model reference.
    ///
    /// Existing directories load locally, anything else is a hub repo id.
    pub fn parse(reference: &str) -> Self {
        let path = Path::new(reference);
        if path.is_dir() {
            ModelSource::Local(path.to_path_buf())
        } else {
            ModelSource::Hub(reference.to_string())
        }
    }

    /// Resolve the three checkpoint files to local paths.
    fn resolve(&self) -> Result<CheckpointFiles> {
        match self {
            ModelSource::Local(dir) => {
                if !dir.exists() {
                    return Err(EmbeddingError::ModelNotFound {
                        path: dir.display().to_string(),
                    });
                }
                let weights = dir.join("model.safetensors");
                if !weights.exists() {
                    return Err(EmbeddingError::WeightLoadError {
                        message: format!(
                            "No weights file found. Expected model.safetensors in {}",
                            dir.display()
                        ),
                    });
                }
                Ok(CheckpointFiles {
                    config: dir.join("config.json"),
                    tokenizer: dir.join("tokenizer.json"),
                    weights,
                })
            }
            ModelSource::Hub(repo_id) => {
                info!("Fetching {} from the Hugging Face Hub", repo_id);
                let repo = Api::new()?.model(repo_id.clone());
                Ok(CheckpointFiles {
                    config: repo.get("config.json")?,
                    tokenizer: repo.get("tokenizer.json")?,
                    weights: repo.get("model.safetensors")?,
                })
            }
        }
    }
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::Local(dir) => write!(f, "{}", dir.display()),
            ModelSource::Hub(repo_id) => write!(f, "hf://{}", repo_id),
        }
    }
}

struct CheckpointFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

/// Qwen3-Embedding model.
///
/// Loaded once and shared read-only. Each forward pass runs on a clone of
/// the model so per-call key/value caches never outlive the call.
pub struct QwenEmbedder {
    model: Qwen3Model,
    tokenizer: QwenTokenizer,
    config: ModelConfig,
    device: Device,
}

impl QwenEmbedder {
    /// Load model, tokenizer and weights from `source`.
    ///
    /// # Errors
    ///
    /// Returns error if any checkpoint file is missing or invalid.
    pub fn load(source: &ModelSource) -> Result<Self> {
        info!("Loading model from: {}", source);
        let files = source.resolve()?;

        let config_json = std::fs::read_to_string(&files.config).map_err(|e| {
            EmbeddingError::ConfigError {
                message: format!(
                    "Failed to read config from {}: {}",
                    files.config.display(),
                    e
                ),
            }
        })?;
        let config = ModelConfig::from_json(&config_json)?;
        let qwen_config: Qwen3Config = serde_json::from_str(&config_json)?;
        debug!(
            "Loaded config: hidden_size={}, layers={}",
            config.hidden_size, config.num_hidden_layers
        );

        let tokenizer = QwenTokenizer::from_file(&files.tokenizer)?
            .with_max_length(config.max_position_embeddings.min(MAX_SEQUENCE_LENGTH));
        debug!("Loaded tokenizer: vocab_size={}", tokenizer.vocab_size());

        let device = Self::get_device()?;
        info!("Using device: {:?}", device);

        let vb = Self::load_weights(&files.weights, &device)?;
        let model =
            Qwen3Model::new(&qwen_config, vb).map_err(|e| EmbeddingError::WeightLoadError {
                message: format!("Failed to load Qwen3 model: {}", e),
            })?;

        info!("Model loaded successfully");

        Ok(Self {
            model,
            tokenizer,
            config,
            device,
        })
    }

    /// Embed an already prepared text.
    ///
    /// Returns a unit-norm vector of `hidden_size` components.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::EmptyInput`] for blank text, or an inference
    /// error if the forward pass fails.
    pub fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let encoded = self.tokenizer.encode(text)?;
        if encoded.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        debug!("Embedding {} tokens", encoded.len());

        let (input_ids, attention_mask) = self.encoding_to_tensors(&encoded)?;

        let mut model = self.model.clone();
        let hidden_states =
            model
                .forward(&input_ids, 0)
                .map_err(|e| EmbeddingError::InferenceError {
                    message: format!("Forward pass failed: {}", e),
                })?;

        let pooled = mean_pool(&hidden_states.to_dtype(DType::F32)?, &attention_mask)?;
        let normalized = l2_normalize(&pooled)?;

        let mut rows: Vec<Vec<f32>> =
            normalized
                .to_vec2()
                .map_err(|e| EmbeddingError::TensorError {
                    message: format!("Failed to convert tensor to vec: {}", e),
                })?;
        rows.pop().ok_or_else(|| EmbeddingError::InferenceError {
            message: "Model returned no embedding".to_string(),
        })
    }

    /// Embed several prepared texts, one forward pass each.
    pub fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        texts.iter().map(|text| self.embed_one(text)).collect()
    }

    /// Get the embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        self.config.hidden_size
    }

    /// Get the model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Get the device being used for inference.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Short device label: `cuda`, `metal` or `cpu`.
    pub fn device_name(&self) -> &'static str {
        match self.device {
            Device::Cuda(_) => "cuda",
            Device::Metal(_) => "metal",
            Device::Cpu => "cpu",
        }
    }

    fn get_device() -> Result<Device> {
        #[cfg(feature = "cuda")]
        {
            if let Ok(device) = Device::new_cuda(0) {
                return Ok(device);
            }
        }

        #[cfg(feature = "metal")]
        {
            if let Ok(device) = Device::new_metal(0) {
                return Ok(device);
            }
        }

        Ok(Device::Cpu)
    }

    fn load_weights(path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
        debug!("Loading weights from: {}", path.display());

        if path.extension().map_or(true, |ext| ext != "safetensors") {
            return Err(EmbeddingError::WeightLoadError {
                message: "Only safetensors format is supported".to_string(),
            });
        }

        let data = std::fs::read(path)?;
        let tensors = candle_core::safetensors::load_buffer(&data, device).map_err(|e| {
            EmbeddingError::WeightLoadError {
                message: format!("Failed to load safetensors: {}", e),
            }
        })?;

        Ok(VarBuilder::from_tensors(
            with_weight_prefix(tensors),
            DType::F32,
            device,
        ))
    }

    fn encoding_to_tensors(&self, encoded: &EncodedInput) -> Result<(Tensor, Tensor)> {
        let input_ids = Tensor::new(encoded.input_ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoded.attention_mask.as_slice(), &self.device)?.unsqueeze(0)?;
        Ok((input_ids, attention_mask))
    }
}

/// Embedding checkpoints are saved without the `model.` prefix the decoder
/// implementation looks up; add it when missing.
fn with_weight_prefix(tensors: HashMap<String, Tensor>) -> HashMap<String, Tensor> {
    if tensors.keys().any(|name| name.starts_with(WEIGHT_PREFIX)) {
        return tensors;
    }
    tensors
        .into_iter()
        .map(|(name, tensor)| (format!("{}{}", WEIGHT_PREFIX, name), tensor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TEST_TOKENIZER_JSON;
    use approx::assert_relative_eq;
    use candle_nn::VarMap;

    const TINY_HIDDEN: usize = 8;

    /// Randomly initialised two-layer decoder over the test vocabulary.
    fn tiny_embedder() -> QwenEmbedder {
        let qwen_config: Qwen3Config = serde_json::from_value(serde_json::json!({
            "vocab_size": 9,
            "hidden_size": TINY_HIDDEN,
            "intermediate_size": 16,
            "num_hidden_layers": 2,
            "num_attention_heads": 2,
            "head_dim": 4,
            "attention_bias": false,
            "num_key_value_heads": 1,
            "max_position_embeddings": 64,
            "sliding_window": null,
            "max_window_layers": 2,
            "tie_word_embeddings": true,
            "rope_theta": 10000.0,
            "rms_norm_eps": 1e-6,
            "use_sliding_window": false,
            "hidden_act": "silu"
        }))
        .unwrap();

        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = Qwen3Model::new(&qwen_config, vb).unwrap();

        QwenEmbedder {
            model,
            tokenizer: QwenTokenizer::from_json(TEST_TOKENIZER_JSON)
                .unwrap()
                .with_max_length(64),
            config: ModelConfig {
                hidden_size: TINY_HIDDEN,
                num_hidden_layers: 2,
                vocab_size: 9,
                max_position_embeddings: 64,
                model_type: Some("qwen3".to_string()),
            },
            device,
        }
    }

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_embed_one_returns_unit_vector_of_hidden_size() {
        let embedder = tiny_embedder();

        for text in ["the quick brown fox", "cats purr", "dogs"] {
            let embedding = embedder.embed_one(text).unwrap();
            assert_eq!(embedding.len(), TINY_HIDDEN);
            assert_eq!(embedding.len(), embedder.embedding_dim());
            assert_relative_eq!(norm(&embedding), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_embed_one_keeps_no_state_between_calls() {
        let embedder = tiny_embedder();

        let first = embedder.embed_one("the quick brown fox").unwrap();
        let other = embedder.embed_one("dogs bark").unwrap();
        let again = embedder.embed_one("the quick brown fox").unwrap();

        assert_eq!(first, again);
        assert_ne!(first, other);
    }

    #[test]
    fn test_embed_rejects_blank_text() {
        let embedder = tiny_embedder();
        assert!(matches!(
            embedder.embed_one("   "),
            Err(EmbeddingError::EmptyInput)
        ));

        let embeddings = embedder.embed(&["cats purr", "dogs bark"]).unwrap();
        assert_eq!(embeddings.len(), 2);
        assert!(matches!(embedder.embed(&[]), Err(EmbeddingError::EmptyInput)));
    }

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert_eq!(config.hidden_size, 1024);
        assert_eq!(config.num_hidden_layers, 28);
        assert_eq!(config.max_position_embeddings, 32768);
    }

    #[test]
    fn test_model_config_from_checkpoint_json() {
        let json = r#"{
            "architectures": ["Qwen3ForCausalLM"],
            "hidden_size": 1024,
            "num_hidden_layers": 28,
            "vocab_size": 151669,
            "max_position_embeddings": 32768,
            "model_type": "qwen3",
            "rope_theta": 1000000
        }"#;

        let config = ModelConfig::from_json(json).unwrap();
        assert_eq!(config.hidden_size, 1024);
        assert_eq!(config.model_type.as_deref(), Some("qwen3"));
    }

    #[test]
    fn test_model_config_rejects_other_architectures() {
        let json = r#"{ "hidden_size": 384, "model_type": "bert" }"#;
        assert!(matches!(
            ModelConfig::from_json(json),
            Err(EmbeddingError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_model_source_parse() {
        let dir = std::env::temp_dir();
        let reference = dir.to_string_lossy().to_string();
        assert_eq!(ModelSource::parse(&reference), ModelSource::Local(dir));
        assert_eq!(
            ModelSource::parse("Qwen/Qwen3-Embedding-0.6B"),
            ModelSource::Hub("Qwen/Qwen3-Embedding-0.6B".to_string())
        );
        assert_eq!(ModelSource::default(), ModelSource::Hub(MODEL_REPO.to_string()));
    }

    #[test]
    fn test_missing_local_model() {
        let source = ModelSource::Local(PathBuf::from("/nonexistent/qwen3"));
        assert!(matches!(
            QwenEmbedder::load(&source),
            Err(EmbeddingError::ModelNotFound { .. })
        ));
    }

    #[test]
    fn test_weight_prefix_added_once() {
        let t = Tensor::zeros(1, DType::F32, &Device::Cpu).unwrap();

        let mut bare = HashMap::new();
        bare.insert("embed_tokens.weight".to_string(), t.clone());
        let prefixed = with_weight_prefix(bare);
        assert!(prefixed.contains_key("model.embed_tokens.weight"));

        let mut already = HashMap::new();
        already.insert("model.norm.weight".to_string(), t);
        let unchanged = with_weight_prefix(already);
        assert!(unchanged.contains_key("model.norm.weight"));
        assert_eq!(unchanged.len(), 1);
    }
}
