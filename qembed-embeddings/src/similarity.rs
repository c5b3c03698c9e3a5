//! Cosine similarity helpers for diagnostics.

/// Cosine similarity between two vectors.
///
/// Returns `0.0` when either vector has zero norm. Vectors of unequal length
/// are compared over their common prefix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Pairwise cosine similarity matrix, with exactly `1.0` on the diagonal.
pub fn similarity_matrix(embeddings: &[Vec<f32>]) -> Vec<Vec<f32>> {
    embeddings
        .iter()
        .enumerate()
        .map(|(i, a)| {
            embeddings
                .iter()
                .enumerate()
                .map(|(j, b)| if i == j { 1.0 } else { cosine_similarity(a, b) })
                .collect()
        })
        .collect()
}
