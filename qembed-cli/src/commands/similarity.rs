//! Pairwise cosine similarity table shared by `smoke` and `embed`.

use colored::Colorize;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use qembed_embeddings::similarity_matrix;

use crate::constants::PREVIEW_CHARS;
use crate::output::{truncate, TableDisplay};

#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub text: String,
}

/// Cosine similarity of every pair of embedded texts.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityMatrix {
    pub labels: Vec<String>,
    pub scores: Vec<Vec<f32>>,
    pub legend: Vec<LegendEntry>,
}

impl SimilarityMatrix {
    /// Build from `(label, vector)` pairs. Returns `None` for fewer than two.
    pub fn from_labelled(rows: Vec<(String, Vec<f32>)>) -> Option<Self> {
        if rows.len() < 2 {
            return None;
        }
        let (labels, vectors): (Vec<String>, Vec<Vec<f32>>) = rows.into_iter().unzip();
        Some(Self {
            labels,
            scores: similarity_matrix(&vectors),
            legend: Vec::new(),
        })
    }

    /// Attach a legend line per text, each cut to the preview length.
    pub fn with_legend<'a>(mut self, texts: impl IntoIterator<Item = &'a str>) -> Self {
        self.legend = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| LegendEntry {
                label: label(i + 1),
                text: truncate(text, PREVIEW_CHARS),
            })
            .collect();
        self
    }
}

/// Row/column label for the 1-based text index.
pub fn label(index: usize) -> String {
    format!("T{}", index)
}

impl TableDisplay for SimilarityMatrix {
    fn to_table(&self) -> String {
        let mut builder = Builder::default();

        let mut header = vec![String::new()];
        header.extend(self.labels.iter().cloned());
        builder.push_record(header);

        for (row_label, row) in self.labels.iter().zip(&self.scores) {
            let mut record = vec![row_label.clone()];
            record.extend(row.iter().map(|score| format!("{:.2}", score)));
            builder.push_record(record);
        }

        let mut table = builder.build();
        table.with(Style::rounded());

        let mut output = format!(
            "{}\n{}\n",
            "Similarity Matrix (Cosine Similarity):".cyan().bold(),
            table
        );

        if !self.legend.is_empty() {
            output.push_str(&format!("\n{}\n", "Legend:".bold()));
            for entry in &self.legend {
                output.push_str(&format!("{}: {}...\n", entry.label, entry.text));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<(String, Vec<f32>)> {
        vec![
            (label(1), vec![1.0, 0.0]),
            (label(3), vec![0.0, 1.0]),
            (label(4), vec![1.0, 1.0]),
        ]
    }

    #[test]
    fn test_needs_two_vectors() {
        assert!(SimilarityMatrix::from_labelled(vec![(label(1), vec![1.0])]).is_none());
        assert!(SimilarityMatrix::from_labelled(Vec::new()).is_none());
    }

    #[test]
    fn test_scores_and_labels() {
        let matrix = SimilarityMatrix::from_labelled(rows()).unwrap();
        assert_eq!(matrix.labels, vec!["T1", "T3", "T4"]);
        assert_eq!(matrix.scores[0][0], 1.0);
        assert!(matrix.scores[0][1].abs() < 1e-6);
        assert!((matrix.scores[0][2] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn test_table_uses_two_decimals() {
        colored::control::set_override(false);
        let matrix = SimilarityMatrix::from_labelled(rows())
            .unwrap()
            .with_legend(["The quick brown fox jumps over the lazy dog and keeps on running"]);
        let table = matrix.to_table();

        assert!(table.contains("1.00"));
        assert!(table.contains("0.71"));
        assert!(table.contains("0.00"));
        assert!(table.contains("T1: The quick brown fox jumps over the lazy dog and ke..."));
    }
}
