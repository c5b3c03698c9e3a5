//! Input preparation: optional prefix plus retrieval instruction templates.

use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Retrieval role the text is embedded for.
///
/// Deserialized through [`FromStr`], so unknown roles are rejected with
/// [`EmbeddingError::InvalidInstruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Instruction {
    /// A search query looking for relevant passages.
    Query,
    /// A document or passage to be retrieved.
    Document,
}

impl Instruction {
    /// Wrap `text` in this role's instruction template.
    pub fn apply(&self, text: &str) -> String {
        match self {
            Instruction::Query => format!(
                "Instruct: Given a query, retrieve relevant passages that answer the query\nQuery: {}",
                text
            ),
            Instruction::Document => {
                format!("Instruct: Embed this document for retrieval\nDocument: {}", text)
            }
        }
    }

    /// Lowercase name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Instruction::Query => "query",
            Instruction::Document => "document",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instruction {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Instruction::Query),
            "document" => Ok(Instruction::Document),
            other => Err(EmbeddingError::InvalidInstruction(other.to_string())),
        }
    }
}

impl TryFrom<String> for Instruction {
    type Error = EmbeddingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Build the exact string fed to the tokenizer.
///
/// A non-empty `prefix` is joined to `text` with a single space and the result
/// trimmed. The instruction template, if any, wraps the combined text.
pub fn prepare_input(text: &str, prefix: Option<&str>, instruction: Option<Instruction>) -> String {
    let full_text = match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{} {}", prefix, text).trim().to_string(),
        _ => text.to_string(),
    };

    match instruction {
        Some(instruction) => instruction.apply(&full_text),
        None => full_text,
    }
}
