//! qembed - smoke-test client for Ollama-compatible embedding services
//!
//! Wakes a remote service that sleeps when idle, makes sure the embedding
//! model is installed, embeds a fixed set of sentences, and prints how
//! similar they are to each other.

use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod client;
mod commands;
mod config;
mod constants;
mod output;
mod probe;

use client::OllamaClient;
use commands::CommandContext;
use config::QembedConfig;
use constants::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL, WAKE_ATTEMPTS, WAKE_INTERVAL};
use output::{OutputConfig, OutputFormat};
use probe::WakePolicy;

/// Smoke-test a remote embedding service.
#[derive(Parser)]
#[command(name = "qembed")]
#[command(author, version)]
#[command(about = "Smoke-test client for Ollama-compatible embedding services")]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  qembed smoke                          Full check against the default service
  qembed --url http://localhost:11434 models
  qembed embed \"first text\" \"second text\"
  qembed --format json smoke > report.json")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the remote service (overrides .qembed.toml)
    #[arg(long, global = true, env = "OLLAMA_URL")]
    url: Option<String>,

    /// Embedding model name (overrides .qembed.toml)
    #[arg(short, long, global = true, env = "OLLAMA_MODEL")]
    model: Option<String>,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    compact: bool,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress progress output and all logs except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Wake the service, pull the model if needed, embed test sentences and compare them
    Smoke {
        /// Probes after the wake request
        #[arg(long, default_value_t = WAKE_ATTEMPTS, hide = true)]
        wake_attempts: u32,

        /// Seconds between wake probes
        #[arg(long, default_value_t = WAKE_INTERVAL.as_secs(), hide = true)]
        wake_interval_secs: u64,
    },

    /// List models installed on the service
    #[command(visible_alias = "ls")]
    Models,

    /// Pull a model onto the service (defaults to --model)
    Pull {
        /// Model to pull
        model: Option<String>,
    },

    /// Embed one or more texts and compare them
    Embed {
        /// Texts to embed
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug,hyper=info,reqwest=info"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = QembedConfig::load(std::path::Path::new("."));

    // CLI flag / env > config file > built-in default
    let url = cli
        .url
        .clone()
        .or_else(|| config.url().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
    let model = cli
        .model
        .clone()
        .or_else(|| config.model().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    let mut output = OutputConfig::auto_detect_with_color_override(format, config.use_color());
    if cli.compact {
        output = output.compact();
    }
    colored::control::set_override(output.use_colors());

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    tracing::debug!("Using {} with model {}", url, model);
    let ctx = CommandContext {
        client: OllamaClient::new(&url, &model)?,
        output,
        quiet: cli.quiet,
    };

    match command {
        Commands::Smoke {
            wake_attempts,
            wake_interval_secs,
        } => {
            let policy = WakePolicy {
                attempts: wake_attempts,
                interval: Duration::from_secs(wake_interval_secs),
            };
            commands::smoke::run(&ctx, &policy).await
        }
        Commands::Models => commands::models::run(&ctx).await,
        Commands::Pull { model } => commands::pull::run(&ctx, model.as_deref()).await,
        Commands::Embed { texts } => commands::embed::run(&ctx, &texts).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_smoke_with_hidden_policy() {
        let cli = Cli::try_parse_from([
            "qembed",
            "--url",
            "http://localhost:11434",
            "smoke",
            "--wake-attempts",
            "1",
            "--wake-interval-secs",
            "0",
        ])
        .unwrap();

        assert_eq!(cli.url.as_deref(), Some("http://localhost:11434"));
        match cli.command {
            Some(Commands::Smoke {
                wake_attempts,
                wake_interval_secs,
            }) => {
                assert_eq!(wake_attempts, 1);
                assert_eq!(wake_interval_secs, 0);
            }
            _ => panic!("expected smoke"),
        }
    }

    #[test]
    fn test_embed_requires_text() {
        assert!(Cli::try_parse_from(["qembed", "embed"]).is_err());
    }

    #[test]
    fn test_format_flag() {
        let cli = Cli::try_parse_from(["qembed", "--format", "json", "models"]).unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(!cli.compact);

        let cli = Cli::try_parse_from(["qembed", "models", "--compact"]).unwrap();
        assert!(cli.compact);
    }
}
