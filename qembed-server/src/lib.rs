//! qembed server library - HTTP surface around the embedding model.
//!
//! This library provides:
//! - The `EmbeddingModel` trait the handlers run against
//! - The axum router, shared state and error mapping

pub mod embeddings;
pub mod server;
