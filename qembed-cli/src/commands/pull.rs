//! Pull command - download a model onto the remote service

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use super::CommandContext;
use crate::client::PullProgress;
use crate::output::{Output, TableDisplay};

/// Outcome of a model pull.
#[derive(Debug, Clone, Serialize)]
pub struct PullReport {
    pub model: String,
    pub pulled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableDisplay for PullReport {
    fn to_table(&self) -> String {
        match &self.error {
            None => format!("{} Model {} pulled successfully", "SUCCESS:".green().bold(), self.model),
            Some(error) => format!(
                "{} Error pulling model {}: {}",
                "ERROR:".red().bold(),
                self.model,
                error
            ),
        }
    }
}

fn create_progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("   {msg} [{bar:30.cyan/blue}] {percent:>3}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}

fn show_progress(bar: &ProgressBar, progress: &PullProgress) {
    if let Some(status) = &progress.status {
        bar.set_message(status.clone());
    }
    match (progress.total, progress.completed) {
        (Some(total), Some(completed)) => {
            bar.set_length(total);
            bar.set_position(completed);
        }
        _ => {
            if let Some(status) = &progress.status {
                bar.println(format!("   {}", status));
            }
        }
    }
}

/// Pull `model`, drawing progress on stderr. Never fails; errors land in the report.
pub async fn pull_with_progress(ctx: &CommandContext, model: &str) -> PullReport {
    ctx.progress(format!("Pulling {}...", model));
    let bar = create_progress_bar(ctx.quiet);

    let result = ctx
        .client
        .pull_model(model, |progress| show_progress(&bar, progress))
        .await;
    bar.finish_and_clear();

    match result {
        Ok(()) => PullReport {
            model: model.to_string(),
            pulled: true,
            error: None,
        },
        Err(e) => {
            tracing::debug!("Pull of {} failed: {:#}", model, e);
            PullReport {
                model: model.to_string(),
                pulled: false,
                error: Some(format!("{:#}", e)),
            }
        }
    }
}

/// Run the pull command
pub async fn run(ctx: &CommandContext, model: Option<&str>) -> anyhow::Result<()> {
    let model = model.unwrap_or_else(|| ctx.client.model()).to_string();
    let report = pull_with_progress(ctx, &model).await;
    let pulled = report.pulled;

    Output::new(report, &ctx.output).render()?;
    if !pulled {
        anyhow::bail!("Failed to pull {}", model);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_table() {
        colored::control::set_override(false);
        let ok = PullReport {
            model: "qwen3-embedding:0.6b".to_string(),
            pulled: true,
            error: None,
        };
        assert_eq!(
            ok.to_table(),
            "SUCCESS: Model qwen3-embedding:0.6b pulled successfully"
        );

        let failed = PullReport {
            pulled: false,
            error: Some("Pull failed: manifest unknown".to_string()),
            ..ok
        };
        assert!(failed.to_table().starts_with("ERROR: Error pulling model"));
    }

    #[test]
    fn test_progress_updates_bar() {
        let bar = ProgressBar::hidden();
        show_progress(
            &bar,
            &PullProgress {
                status: Some("pulling abc".to_string()),
                total: Some(400),
                completed: Some(100),
                error: None,
            },
        );
        assert_eq!(bar.length(), Some(400));
        assert_eq!(bar.position(), 100);
        assert_eq!(bar.message(), "pulling abc");
    }
}
