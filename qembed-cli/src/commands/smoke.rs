//! Smoke command - end-to-end check of a remote embedding service
//!
//! Runs, in order:
//! 1. Wake the service and wait until it answers
//! 2. List installed models
//! 3. Pull the model if it is missing
//! 4. Embed the fixed test sentences
//! 5. Compare them pairwise
//! 6. Print the details needed to call the endpoint from elsewhere
//!
//! Remote failures never abort the run; they are reported and the run
//! carries on (or stops early if the service never wakes).

use colored::Colorize;
use serde::Serialize;

use super::embed::{embed_texts, EmbeddingOutcome};
use super::models::ModelList;
use super::pull::{pull_with_progress, PullReport};
use super::similarity::SimilarityMatrix;
use super::CommandContext;
use crate::constants::TEST_SENTENCES;
use crate::output::{Output, TableDisplay};
use crate::probe::{wait_until_ready, ProbeOutcome, WakePolicy};

/// How the model came to be available.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelAvailability {
    AlreadyAvailable,
    Pulled(PullReport),
    PullFailed(PullReport),
}

/// What a caller needs to use the endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationDetails {
    pub endpoint: String,
    pub model: String,
    pub method: String,
    pub body: String,
}

impl IntegrationDetails {
    fn new(endpoint: String, model: &str) -> Self {
        Self {
            endpoint,
            model: model.to_string(),
            method: "POST".to_string(),
            body: serde_json::json!({ "model": model, "prompt": "your text" }).to_string(),
        }
    }
}

/// Everything observed during a smoke run.
#[derive(Debug, Serialize)]
pub struct SmokeReport {
    pub url: String,
    pub model: String,
    pub probe: ProbeOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_status: Option<ModelAvailability>,
    pub embeddings: Vec<EmbeddingOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<SimilarityMatrix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integration: Option<IntegrationDetails>,
}

impl SmokeReport {
    fn unreachable(url: &str, model: &str, probe: ProbeOutcome) -> Self {
        Self {
            url: url.to_string(),
            model: model.to_string(),
            probe,
            models: None,
            model_status: None,
            embeddings: Vec::new(),
            similarity: None,
            integration: None,
        }
    }
}

fn heading(text: &str) -> String {
    format!("{}\n", text.cyan().bold())
}

impl TableDisplay for SmokeReport {
    fn to_table(&self) -> String {
        let rule = "=".repeat(60);
        let mut output = format!("{}\n", rule.dimmed());
        output.push_str(&heading(&format!("Embedding smoke test: {}", self.url)));
        output.push_str(&format!("{}\n\n", rule.dimmed()));

        if !self.probe.is_ready() {
            output.push_str(&format!(
                "{} Failed to wake service after {} probes",
                "ERROR:".red().bold(),
                self.probe.probes
            ));
            return output;
        }
        let note = if self.probe.woke { " (woken up)" } else { "" };
        output.push_str(&format!("{} Service is active{}\n\n", "OK".green().bold(), note));

        if let Some(models) = &self.models {
            output.push_str(&models.to_table());
            output.push_str("\n\n");
        }

        match &self.model_status {
            Some(ModelAvailability::AlreadyAvailable) => output.push_str(&format!(
                "{} Model {} is already available\n\n",
                "OK".green().bold(),
                self.model
            )),
            Some(ModelAvailability::Pulled(report)) | Some(ModelAvailability::PullFailed(report)) => {
                output.push_str(&format!("Model {} not found.\n", self.model));
                output.push_str(&report.to_table());
                output.push_str("\n\n");
            }
            None => {}
        }

        output.push_str(&heading("Testing embeddings:"));
        for result in &self.embeddings {
            output.push_str(&format!(
                "{}/{}: {}...\n{}\n",
                result.index,
                self.embeddings.len(),
                result.preview,
                result.to_line()
            ));
        }
        output.push('\n');

        if let Some(similarity) = &self.similarity {
            output.push_str(&similarity.to_table());
            output.push('\n');
        }

        output.push_str(&format!("{}\n", rule.dimmed()));
        output.push_str(&format!("{} Test Complete!\n", "OK".green().bold()));

        if let Some(details) = &self.integration {
            output.push_str(&format!("\n{}", heading("Integration details:")));
            output.push_str(&format!("   - Endpoint: {}\n", details.endpoint));
            output.push_str(&format!("   - Model: {}\n", details.model));
            output.push_str(&format!("   - Method: {}\n", details.method));
            output.push_str(&format!("   - Body: {}", details.body));
        }

        output
    }
}

/// Run every smoke step and collect the report.
pub async fn execute(ctx: &CommandContext, policy: &WakePolicy) -> SmokeReport {
    let client = &ctx.client;
    let url = client.base_url();
    let model = client.model();

    ctx.progress("Checking service status...");
    let total_secs = policy.budget().as_secs();
    let interval_secs = policy.interval.as_secs();
    let probe = wait_until_ready(client, policy, |attempt| {
        ctx.progress(format!(
            "Waiting... ({}/{} seconds)",
            u64::from(attempt) * interval_secs,
            total_secs
        ));
    })
    .await;

    if !probe.is_ready() {
        tracing::warn!("Service at {} did not wake up", url);
        return SmokeReport::unreachable(url, model, probe);
    }

    let models = match client.list_models().await {
        Ok(models) => models,
        Err(e) => {
            ctx.progress(format!("Error listing models: {:#}", e));
            Vec::new()
        }
    };
    let models = ModelList {
        url: url.to_string(),
        models,
    };

    let model_status = if models.contains(model) {
        ModelAvailability::AlreadyAvailable
    } else {
        let report = pull_with_progress(ctx, model).await;
        if report.pulled {
            ModelAvailability::Pulled(report)
        } else {
            ModelAvailability::PullFailed(report)
        }
    };

    let (embeddings, vectors) = embed_texts(ctx, TEST_SENTENCES).await;
    let similarity = SimilarityMatrix::from_labelled(vectors)
        .map(|m| m.with_legend(TEST_SENTENCES.iter().copied()));

    SmokeReport {
        url: url.to_string(),
        model: model.to_string(),
        probe,
        models: Some(models),
        model_status: Some(model_status),
        embeddings,
        similarity,
        integration: Some(IntegrationDetails::new(client.embeddings_url(), model)),
    }
}

/// Run the smoke command
pub async fn run(ctx: &CommandContext, policy: &WakePolicy) -> anyhow::Result<()> {
    let report = execute(ctx, policy).await;
    Output::new(report, &ctx.output).render()
}
