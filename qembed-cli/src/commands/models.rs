//! Models command - list models installed on the remote service

use colored::Colorize;
use serde::Serialize;

use super::CommandContext;
use crate::output::{Output, TableDisplay};

#[derive(Debug, Serialize)]
pub struct ModelList {
    pub url: String,
    pub models: Vec<String>,
}

impl ModelList {
    pub fn contains(&self, name: &str) -> bool {
        self.models.iter().any(|m| m == name)
    }
}

impl TableDisplay for ModelList {
    fn to_table(&self) -> String {
        let mut output = format!("{}\n", "Available models:".cyan().bold());
        if self.models.is_empty() {
            output.push_str(&format!("   {}", "No models found".dimmed()));
        } else {
            let lines: Vec<String> = self.models.iter().map(|m| format!("   - {}", m)).collect();
            output.push_str(&lines.join("\n"));
        }
        output
    }
}

/// Run the models command
pub async fn run(ctx: &CommandContext) -> anyhow::Result<()> {
    let models = ctx.client.list_models().await?;
    let list = ModelList {
        url: ctx.client.base_url().to_string(),
        models,
    };
    Output::new(list, &ctx.output).render()
}
