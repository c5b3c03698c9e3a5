//! Shared application state for the server.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use super::error::ApiError;
use crate::embeddings::EmbeddingModel;

/// Lifecycle of the single model instance.
#[derive(Clone)]
pub enum ModelState {
    /// Weights are still being loaded.
    Loading,
    /// Model is loaded and shared read-only by all requests.
    Ready(Arc<dyn EmbeddingModel>),
    /// Loading failed with the given message.
    Failed(String),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    model: Arc<RwLock<ModelState>>,
    start_time: Instant,
}

impl AppState {
    /// State for a service whose model is still loading.
    pub fn loading() -> Self {
        Self {
            model: Arc::new(RwLock::new(ModelState::Loading)),
            start_time: Instant::now(),
        }
    }

    /// State with an already loaded model.
    pub fn ready(model: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            model: Arc::new(RwLock::new(ModelState::Ready(model))),
            start_time: Instant::now(),
        }
    }

    /// Publish the loaded model.
    pub async fn set_ready(&self, model: Arc<dyn EmbeddingModel>) {
        *self.model.write().await = ModelState::Ready(model);
    }

    /// Record a load failure.
    pub async fn set_failed(&self, message: impl Into<String>) {
        *self.model.write().await = ModelState::Failed(message.into());
    }

    /// Current model lifecycle state.
    pub async fn model_state(&self) -> ModelState {
        self.model.read().await.clone()
    }

    /// Loaded model, or the availability error to return to the client.
    pub async fn model(&self) -> Result<Arc<dyn EmbeddingModel>, ApiError> {
        match &*self.model.read().await {
            ModelState::Ready(model) => Ok(model.clone()),
            ModelState::Loading => Err(ApiError::ModelLoading),
            ModelState::Failed(message) => Err(ApiError::ModelUnavailable(message.clone())),
        }
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}
