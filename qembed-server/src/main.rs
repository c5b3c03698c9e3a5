//! qembed server - HTTP embedding service.
//!
//! Loads Qwen3-Embedding-0.6B once at startup and serves:
//! - `GET /`, `/health`, `/info` for service discovery
//! - `POST /embed` and `POST /embed/batch` for embeddings

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use qembed_embeddings::{ModelSource, QwenEmbedder, MODEL_REPO};
use qembed_server::server::{create_router, AppState};

/// Qwen3-Embedding HTTP service
#[derive(Parser, Debug)]
#[command(name = "qembed-server")]
#[command(about = "HTTP embedding service for Qwen3-Embedding-0.6B")]
#[command(version)]
struct Cli {
    /// Address to bind
    #[arg(long, env = "QEMBED_HOST", default_value = "0.0.0.0")]
    host: String,

    /// HTTP port to listen on
    #[arg(short, long, env = "QEMBED_PORT", default_value = "8080")]
    port: u16,

    /// Model directory or Hugging Face repo id
    #[arg(long, env = "QEMBED_MODEL", default_value = MODEL_REPO)]
    model: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    let source = ModelSource::parse(&cli.model);
    let state = AppState::loading();

    let router = create_router(state.clone());
    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Embedding server listening on http://{}", addr);
    info!("Model: {} (MRL: 32-1024 dims)", source);

    let server = tokio::spawn(async move { axum::serve(listener, router).await });

    // Requests get 503 until the model is published to the state, and keep
    // getting it if loading fails.
    load_model(source, &state).await?;

    server.await??;
    Ok(())
}

/// Load the model and publish the outcome to `state`.
///
/// Only a panicking load task is an error; a failed load is recorded so
/// `/health` can report it.
async fn load_model(source: ModelSource, state: &AppState) -> Result<()> {
    info!("Loading model, this may take a few minutes on first run...");

    let loaded = tokio::task::spawn_blocking(move || QwenEmbedder::load(&source))
        .await
        .context("Model loading task panicked")?;

    match loaded {
        Ok(model) => {
            info!(
                "Model loaded on {} ({} dimensions)",
                model.device_name(),
                model.embedding_dim()
            );
            state.set_ready(Arc::new(model)).await;
        }
        Err(e) => {
            error!("Failed to load model: {}", e);
            state.set_failed(e.to_string()).await;
        }
    }
    Ok(())
}
