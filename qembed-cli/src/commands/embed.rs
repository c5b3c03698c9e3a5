//! Embed command - generate embeddings on the remote service
//!
//! Embeds each text in turn, reports its dimensions (or the error), and
//! compares every successful pair when more than one text is given.

use std::time::Instant;

use colored::Colorize;
use serde::Serialize;

use super::similarity::{label, SimilarityMatrix};
use super::CommandContext;
use crate::constants::PREVIEW_CHARS;
use crate::output::{truncate, Output, TableDisplay};

/// Result of embedding one text.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingOutcome {
    /// 1-based position of the text in the input.
    pub index: usize,
    pub preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EmbeddingOutcome {
    pub fn succeeded(&self) -> bool {
        self.dimensions.is_some()
    }

    pub fn to_line(&self) -> String {
        match (&self.dimensions, &self.error) {
            (Some(dimensions), _) => {
                format!("   {} Dimensions: {}", "OK".green().bold(), dimensions)
            }
            (None, error) => format!(
                "   {} {}",
                "FAILED".red().bold(),
                error.as_deref().unwrap_or("Unknown error")
            ),
        }
    }
}

/// Embed every text in order. Failures are recorded and skipped.
///
/// Returns one outcome per text plus the labelled vectors of the successes.
pub async fn embed_texts(
    ctx: &CommandContext,
    texts: &[&str],
) -> (Vec<EmbeddingOutcome>, Vec<(String, Vec<f32>)>) {
    let mut outcomes = Vec::with_capacity(texts.len());
    let mut vectors = Vec::new();

    for (i, text) in texts.iter().enumerate() {
        let index = i + 1;
        let preview = truncate(text, PREVIEW_CHARS);
        ctx.progress(format!(
            "Generating embedding {}/{}: {}...",
            index,
            texts.len(),
            preview
        ));

        let outcome = match ctx.client.embed(text).await {
            Ok(vector) => {
                let outcome = EmbeddingOutcome {
                    index,
                    preview,
                    dimensions: Some(vector.len()),
                    error: None,
                };
                vectors.push((label(index), vector));
                outcome
            }
            Err(e) => {
                tracing::debug!("Embedding {} failed: {:#}", index, e);
                EmbeddingOutcome {
                    index,
                    preview,
                    dimensions: None,
                    error: Some(format!("{:#}", e)),
                }
            }
        };
        ctx.progress(outcome.to_line());
        outcomes.push(outcome);
    }

    (outcomes, vectors)
}

#[derive(Debug, Serialize)]
pub struct EmbedReport {
    pub model: String,
    pub results: Vec<EmbeddingOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<SimilarityMatrix>,
    pub duration_ms: u64,
}

impl TableDisplay for EmbedReport {
    fn to_table(&self) -> String {
        let mut output = format!("{} {}\n", "Model:".cyan().bold(), self.model);

        for result in &self.results {
            output.push_str(&format!(
                "\n{}: {}...\n{}\n",
                label(result.index),
                result.preview,
                result.to_line()
            ));
        }

        if let Some(similarity) = &self.similarity {
            output.push('\n');
            output.push_str(&similarity.to_table());
        }

        output.push_str(&format!(
            "\n{} {}ms",
            "Duration:".dimmed(),
            self.duration_ms
        ));
        output
    }
}

/// Run the embed command
pub async fn run(ctx: &CommandContext, texts: &[String]) -> anyhow::Result<()> {
    let start = Instant::now();
    let texts: Vec<&str> = texts.iter().map(String::as_str).collect();

    let (results, vectors) = embed_texts(ctx, &texts).await;
    let succeeded = results.iter().filter(|r| r.succeeded()).count();
    let similarity =
        SimilarityMatrix::from_labelled(vectors).map(|m| m.with_legend(texts.iter().copied()));

    let report = EmbedReport {
        model: ctx.client.model().to_string(),
        results,
        similarity,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Output::new(report, &ctx.output).render()?;

    if succeeded == 0 {
        anyhow::bail!("No embeddings were generated");
    }
    Ok(())
}
