//! HTTP routes and handlers for the embedding API.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use qembed_embeddings::{
    mrl_applied, prepare_input, truncate, validate_dimensions, Instruction,
    DEFAULT_EMBEDDING_DIM, MAX_SEQUENCE_LENGTH, MODEL_NAME, MODEL_REPO,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use super::error::ApiError;
use super::state::{AppState, ModelState};
use crate::embeddings::EmbeddingModel;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Service description
        .route("/", get(root))
        .route("/info", get(info))
        // Health
        .route("/health", get(health))
        // Embeddings
        .route("/embed", post(embed))
        .route("/embed/batch", post(embed_batch))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /embed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub text: String,
    #[serde(default)]
    pub prefix: Option<String>,
    /// MRL target size, 32..=1024
    #[serde(default)]
    pub dimensions: Option<usize>,
    #[serde(default)]
    pub instruction: Option<Instruction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
    pub dimensions: usize,
    pub model: String,
    pub text_length: usize,
    pub mrl_applied: bool,
}

/// Body of `POST /embed/batch` in object form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchEmbedRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub instruction: Option<Instruction>,
    #[serde(default)]
    pub dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEmbedResponse {
    /// One entry per input; `null` where that input failed.
    pub embeddings: Vec<Option<Vec<f32>>>,
    pub model: String,
    pub count: usize,
    pub dimensions: usize,
    pub failed: usize,
}

/// Batch body: either a bare array of texts or a full request object.
#[derive(Deserialize)]
#[serde(untagged)]
enum BatchBody {
    Texts(Vec<String>),
    Request(BatchEmbedRequest),
}

#[derive(Debug, Default, Deserialize)]
struct BatchParams {
    instruction: Option<Instruction>,
    dimensions: Option<usize>,
}

// =============================================================================
// Service Description
// =============================================================================

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": format!("{} Server", MODEL_NAME),
        "version": env!("CARGO_PKG_VERSION"),
        "model": MODEL_REPO,
        "features": {
            "mrl": "Matryoshka Representation Learning (32-1024 dims)",
            "context_length": MAX_SEQUENCE_LENGTH,
            "default_dimensions": DEFAULT_EMBEDDING_DIM,
            "multilingual": true
        },
        "endpoints": {
            "/health": "Health check",
            "/embed": "Generate embeddings",
            "/embed/batch": "Generate embeddings for multiple texts",
            "/info": "Model information"
        }
    }))
}

async fn info() -> impl IntoResponse {
    Json(serde_json::json!({
        "model": {
            "name": MODEL_NAME,
            "parameters": "0.6B",
            "architecture": "Transformer-based",
            "training": "Contrastive learning"
        },
        "capabilities": {
            "languages": "Multilingual (29+ languages)",
            "max_tokens": MAX_SEQUENCE_LENGTH,
            "embedding_dim": DEFAULT_EMBEDDING_DIM,
            "mrl": "32-1024 dimensions without retraining"
        },
        "usage": {
            "query": "Use instruction='query' for search queries",
            "document": "Use instruction='document' for documents",
            "dimensions": "Specify 32-1024 for custom dimensions"
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = match state.model_state().await {
        ModelState::Ready(model) => serde_json::json!({
            "status": "healthy",
            "model": model.model_name(),
            "model_loaded": true,
            "device": model.device(),
            "max_context": MAX_SEQUENCE_LENGTH,
            "dimensions": model.dimension(),
            "mrl_range": "32-1024",
            "uptime_seconds": state.uptime_seconds()
        }),
        ModelState::Loading => serde_json::json!({
            "status": "loading",
            "model": MODEL_NAME,
            "model_loaded": false
        }),
        ModelState::Failed(error) => serde_json::json!({
            "status": "failed",
            "model": MODEL_NAME,
            "model_loaded": false,
            "error": error
        }),
    };
    Json(body)
}

// =============================================================================
// Embeddings
// =============================================================================

/// Validate, prepare and embed a single request.
///
/// Runs the forward pass synchronously; call from a blocking context.
pub fn embed_one(
    model: &dyn EmbeddingModel,
    request: &EmbedRequest,
) -> Result<EmbedResponse, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Text cannot be empty".to_string()));
    }
    let dimensions = validate_dimensions(request.dimensions)?;

    let full_text = prepare_input(
        &request.text,
        request.prefix.as_deref(),
        request.instruction,
    );
    debug!(
        chars = full_text.chars().count(),
        instruction = ?request.instruction,
        "embedding text"
    );

    let embedding = model
        .embed(&full_text)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let embedding = truncate(embedding, dimensions);

    Ok(EmbedResponse {
        dimensions: embedding.len(),
        embedding,
        model: model.model_name().to_string(),
        text_length: full_text.chars().count(),
        mrl_applied: mrl_applied(dimensions),
    })
}

async fn embed(
    State(state): State<AppState>,
    payload: Result<Json<EmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let Json(request) = payload?;
    let model = state.model().await?;

    let response = tokio::task::spawn_blocking(move || embed_one(model.as_ref(), &request))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(response))
}

async fn embed_batch(
    State(state): State<AppState>,
    params: Result<Query<BatchParams>, QueryRejection>,
    body: Result<Json<BatchBody>, JsonRejection>,
) -> Result<Json<BatchEmbedResponse>, ApiError> {
    let Query(params) = params?;
    let Json(body) = body?;
    let model = state.model().await?;

    let mut request = match body {
        BatchBody::Texts(texts) => BatchEmbedRequest {
            texts,
            ..Default::default()
        },
        BatchBody::Request(request) => request,
    };
    if params.instruction.is_some() {
        request.instruction = params.instruction;
    }
    if params.dimensions.is_some() {
        request.dimensions = params.dimensions;
    }

    let response = tokio::task::spawn_blocking(move || run_batch(model.as_ref(), request))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(response))
}

fn run_batch(model: &dyn EmbeddingModel, request: BatchEmbedRequest) -> BatchEmbedResponse {
    let dimensions = request.dimensions;
    let instruction = request.instruction;

    let embeddings: Vec<Option<Vec<f32>>> = request
        .texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let item = EmbedRequest {
                text,
                prefix: None,
                dimensions,
                instruction,
            };
            match embed_one(model, &item) {
                Ok(response) => Some(response.embedding),
                Err(e) => {
                    warn!(index, "Error processing text: {}", e);
                    None
                }
            }
        })
        .collect();

    let failed = embeddings.iter().filter(|e| e.is_none()).count();

    BatchEmbedResponse {
        count: embeddings.len(),
        embeddings,
        model: model.model_name().to_string(),
        dimensions: dimensions.unwrap_or(DEFAULT_EMBEDDING_DIM),
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::EmbeddingResult;
    use qembed_embeddings::EmbeddingError;

    /// Returns a fixed unit vector, failing on texts containing "boom".
    struct UnitModel;

    impl EmbeddingModel for UnitModel {
        fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
            if text.contains("boom") {
                return Err(EmbeddingError::InferenceError {
                    message: "exploded".to_string(),
                });
            }
            let mut v = vec![0.0f32; DEFAULT_EMBEDDING_DIM];
            v[0] = 0.6;
            v[DEFAULT_EMBEDDING_DIM - 1] = 0.8;
            Ok(v)
        }

        fn dimension(&self) -> usize {
            DEFAULT_EMBEDDING_DIM
        }

        fn model_name(&self) -> &str {
            "unit"
        }
    }

    fn request(text: &str) -> EmbedRequest {
        EmbedRequest {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_embed_one_full_size() {
        let response = embed_one(&UnitModel, &request("hello")).unwrap();
        assert_eq!(response.dimensions, 1024);
        assert_eq!(response.embedding.len(), 1024);
        assert_eq!(response.text_length, 5);
        assert!(!response.mrl_applied);
    }

    #[test]
    fn test_embed_one_truncates_without_renormalizing() {
        let mut req = request("hello");
        req.dimensions = Some(32);
        let response = embed_one(&UnitModel, &req).unwrap();

        assert_eq!(response.dimensions, 32);
        assert_eq!(response.embedding[0], 0.6);
        assert!(response.mrl_applied);
    }

    #[test]
    fn test_embed_one_rejects_blank_text() {
        let err = embed_one(&UnitModel, &request("  \n\t ")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Text cannot be empty"));
    }

    #[test]
    fn test_embed_one_rejects_out_of_range_dimensions() {
        for dims in [0, 31, 1025] {
            let mut req = request("hello");
            req.dimensions = Some(dims);
            assert!(matches!(
                embed_one(&UnitModel, &req),
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn test_text_length_counts_instruction_and_prefix() {
        let mut req = request("cats");
        req.prefix = Some("about".to_string());
        req.instruction = Some(Instruction::Document);
        let response = embed_one(&UnitModel, &req).unwrap();

        let expected = "Instruct: Embed this document for retrieval\nDocument: about cats";
        assert_eq!(response.text_length, expected.chars().count());
    }

    #[test]
    fn test_model_failure_is_internal() {
        let err = embed_one(&UnitModel, &request("boom")).unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
        assert!(err.to_string().starts_with("Error generating embedding:"));
    }

    #[test]
    fn test_run_batch_counts_failures() {
        let request = BatchEmbedRequest {
            texts: vec!["a".into(), "".into(), "boom".into(), "b".into()],
            instruction: Some(Instruction::Query),
            dimensions: Some(64),
        };
        let response = run_batch(&UnitModel, request);

        assert_eq!(response.count, 4);
        assert_eq!(response.embeddings.len(), 4);
        assert_eq!(response.failed, 2);
        assert_eq!(
            response.failed,
            response.embeddings.iter().filter(|e| e.is_none()).count()
        );
        assert_eq!(response.dimensions, 64);
        assert_eq!(response.embeddings[0].as_ref().map(Vec::len), Some(64));
    }

    #[test]
    fn test_run_batch_out_of_range_dimensions_fail_per_item() {
        let request = BatchEmbedRequest {
            texts: vec!["a".into(), "b".into()],
            instruction: None,
            dimensions: Some(8),
        };
        let response = run_batch(&UnitModel, request);

        assert_eq!(response.count, 2);
        assert_eq!(response.failed, 2);
        assert!(response.embeddings.iter().all(Option::is_none));
        assert_eq!(response.dimensions, 8);
    }
}
