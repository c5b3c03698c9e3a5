//! Matryoshka (MRL) dimension handling.

use crate::error::{EmbeddingError, Result};
use crate::{DEFAULT_EMBEDDING_DIM, MIN_EMBEDDING_DIM};

/// Check a requested output dimension against the supported MRL range.
///
/// `None` means "full size" and is always accepted.
pub fn validate_dimensions(dimensions: Option<usize>) -> Result<Option<usize>> {
    match dimensions {
        Some(d) if !(MIN_EMBEDDING_DIM..=DEFAULT_EMBEDDING_DIM).contains(&d) => {
            Err(EmbeddingError::InvalidDimensions { requested: d })
        }
        other => Ok(other),
    }
}

/// Keep the leading `dimensions` components of a normalized embedding.
///
/// The result is not re-normalized.
pub fn truncate(mut embedding: Vec<f32>, dimensions: Option<usize>) -> Vec<f32> {
    if let Some(d) = dimensions {
        embedding.truncate(d);
    }
    embedding
}

/// Whether a request for `dimensions` shortens the vector.
pub fn mrl_applied(dimensions: Option<usize>) -> bool {
    matches!(dimensions, Some(d) if d != DEFAULT_EMBEDDING_DIM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds() {
        assert_eq!(validate_dimensions(None).unwrap(), None);
        assert_eq!(validate_dimensions(Some(32)).unwrap(), Some(32));
        assert_eq!(validate_dimensions(Some(1024)).unwrap(), Some(1024));
        assert!(matches!(
            validate_dimensions(Some(31)),
            Err(EmbeddingError::InvalidDimensions { requested: 31 })
        ));
        assert!(validate_dimensions(Some(1025)).is_err());
        assert!(validate_dimensions(Some(0)).is_err());
    }

    #[test]
    fn test_truncate_keeps_leading_values() {
        let embedding: Vec<f32> = (0..1024).map(|i| i as f32 * 0.001).collect();
        let short = truncate(embedding.clone(), Some(64));
        assert_eq!(short.len(), 64);
        assert_eq!(&short[..], &embedding[..64]);
    }

    #[test]
    fn test_truncate_without_request_is_identity() {
        let embedding = vec![0.6f32, 0.8];
        assert_eq!(truncate(embedding.clone(), None), embedding);
        assert_eq!(truncate(embedding.clone(), Some(1024)), embedding);
    }

    #[test]
    fn test_truncated_vector_is_not_renormalized() {
        let embedding = vec![0.6f32, 0.8, 0.0];
        let short = truncate(embedding, Some(1));
        assert_eq!(short, vec![0.6]);
    }

    #[test]
    fn test_mrl_applied() {
        assert!(!mrl_applied(None));
        assert!(!mrl_applied(Some(1024)));
        assert!(mrl_applied(Some(256)));
    }
}
