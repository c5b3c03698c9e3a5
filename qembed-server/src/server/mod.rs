//! HTTP server for the embedding service.
//!
//! Provides REST API for:
//! - Service description and health checks
//! - Single and batch embedding generation

mod error;
mod http;
pub mod state;

pub use error::ApiError;
pub use http::{
    create_router, embed_one, BatchEmbedRequest, BatchEmbedResponse, EmbedRequest, EmbedResponse,
};
pub use state::{AppState, ModelState};
