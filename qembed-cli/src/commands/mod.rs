//! Command implementations for the qembed CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod embed;
pub mod models;
pub mod pull;
pub mod similarity;
pub mod smoke;

use std::fmt::Display;

use crate::client::OllamaClient;
use crate::output::OutputConfig;

/// Everything a command needs: the remote client and how to print.
pub struct CommandContext {
    pub client: OllamaClient,
    pub output: OutputConfig,
    pub quiet: bool,
}

impl CommandContext {
    /// Live progress line on stderr, silenced by `--quiet`.
    pub fn progress(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }
}
