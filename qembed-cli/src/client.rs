//! Client for Ollama-compatible embedding services.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{EMBED_TIMEOUT, PROBE_TIMEOUT, PULL_TIMEOUT, WAKE_TIMEOUT};
use crate::probe::RemoteService;

/// One line of the `/api/pull` progress stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PullProgress {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub completed: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client bound to one remote service and model.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("qembed/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Public embeddings endpoint, as printed in integration details.
    pub fn embeddings_url(&self) -> String {
        self.url("/api/embeddings")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Names of the models installed on the remote service.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.url("/api/tags"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Pull `name`, reporting every progress line to `on_progress`.
    ///
    /// Fails if the stream carries an `error` line.
    pub async fn pull_model(
        &self,
        name: &str,
        mut on_progress: impl FnMut(&PullProgress),
    ) -> Result<()> {
        let mut response = self
            .http
            .post(self.url("/api/pull"))
            .json(&serde_json::json!({ "name": name }))
            .timeout(PULL_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let mut lines = LineBuffer::default();
        while let Some(chunk) = response.chunk().await? {
            for line in lines.push(&chunk) {
                handle_pull_line(&line, &mut on_progress)?;
            }
        }
        if let Some(line) = lines.finish() {
            handle_pull_line(&line, &mut on_progress)?;
        }

        Ok(())
    }

    /// Embed `prompt` with the configured model.
    pub async fn embed(&self, prompt: &str) -> Result<Vec<f32>> {
        let response = self
            .http
            .post(self.url("/api/embeddings"))
            .json(&EmbeddingsRequest {
                model: &self.model,
                prompt,
            })
            .timeout(EMBED_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Status {}: {}", status.as_u16(), body);
        }

        let parsed: EmbeddingsResponse = response.json().await?;
        parsed
            .embedding
            .ok_or_else(|| anyhow!(parsed.error.unwrap_or_else(|| "Unknown error".to_string())))
    }
}

impl RemoteService for OllamaClient {
    async fn probe(&self) -> bool {
        let result = self
            .http
            .get(self.url("/api/tags"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Probe failed: {}", e);
                false
            }
        }
    }

    async fn wake(&self) {
        if let Err(e) = self
            .http
            .get(&self.base_url)
            .timeout(WAKE_TIMEOUT)
            .send()
            .await
        {
            debug!("Wake request failed: {}", e);
        }
    }
}

fn handle_pull_line(line: &str, on_progress: &mut impl FnMut(&PullProgress)) -> Result<()> {
    let progress: PullProgress = serde_json::from_str(line)
        .with_context(|| format!("Invalid pull progress line: {}", line))?;
    if let Some(error) = &progress.error {
        bail!("Pull failed: {}", error);
    }
    on_progress(&progress);
    Ok(())
}

/// Splits a byte stream into complete, non-blank lines.
#[derive(Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    fn finish(self) -> Option<String> {
        let line = String::from_utf8_lossy(&self.pending).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}
