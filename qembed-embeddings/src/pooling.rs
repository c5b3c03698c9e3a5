//! Pooling and normalization over transformer hidden states.

use crate::error::Result;
use candle_core::{DType, Tensor};

/// Average token vectors weighted by the attention mask.
///
/// `hidden_states` is `(batch, seq, hidden)`, `attention_mask` is `(batch, seq)`
/// with 1 for real tokens and 0 for padding. Returns `(batch, hidden)`.
pub fn mean_pool(hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask
        .to_dtype(hidden_states.dtype())?
        .unsqueeze(2)?
        .broadcast_as(hidden_states.shape())?;
    let sum = (hidden_states * &mask)?.sum(1)?;
    // Fully padded rows would otherwise divide by zero
    let count = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
    Ok(sum.broadcast_div(&count)?)
}

/// Scale every row of a `(batch, hidden)` tensor to unit L2 norm.
pub fn l2_normalize(embeddings: &Tensor) -> Result<Tensor> {
    let embeddings = embeddings.to_dtype(DType::F32)?;
    let norm = embeddings
        .sqr()?
        .sum_keepdim(1)?
        .sqrt()?
        .clamp(1e-12f32, f32::MAX)?;
    Ok(embeddings.broadcast_div(&norm)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use candle_core::Device;

    fn hidden() -> Tensor {
        // batch 1, seq 3, hidden 2
        Tensor::new(&[[[1.0f32, 2.0], [3.0, 4.0], [100.0, 100.0]]], &Device::Cpu).unwrap()
    }

    #[test]
    fn test_mean_pool_ignores_padding() {
        let mask = Tensor::new(&[[1u32, 1, 0]], &Device::Cpu).unwrap();
        let pooled = mean_pool(&hidden(), &mask).unwrap();
        let values: Vec<Vec<f32>> = pooled.to_vec2().unwrap();
        assert_eq!(values, vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn test_mean_pool_full_mask_is_plain_mean() {
        let mask = Tensor::new(&[[1u32, 1, 1]], &Device::Cpu).unwrap();
        let pooled = mean_pool(&hidden(), &mask).unwrap();
        let values: Vec<Vec<f32>> = pooled.to_vec2().unwrap();
        assert_relative_eq!(values[0][0], 104.0 / 3.0, epsilon = 1e-4);
        assert_relative_eq!(values[0][1], 106.0 / 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_mean_pool_empty_mask_yields_zeros() {
        let mask = Tensor::new(&[[0u32, 0, 0]], &Device::Cpu).unwrap();
        let pooled = mean_pool(&hidden(), &mask).unwrap();
        let values: Vec<Vec<f32>> = pooled.to_vec2().unwrap();
        assert_eq!(values, vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn test_l2_normalize_rows_are_unit_length() {
        let t = Tensor::new(&[[3.0f32, 4.0], [0.5, -0.5]], &Device::Cpu).unwrap();
        let normalized: Vec<Vec<f32>> = l2_normalize(&t).unwrap().to_vec2().unwrap();

        assert_relative_eq!(normalized[0][0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(normalized[0][1], 0.8, epsilon = 1e-6);
        for row in &normalized {
            let norm: f32 = row.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert_relative_eq!(norm, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_l2_normalize_zero_row_stays_zero() {
        let t = Tensor::new(&[[0.0f32, 0.0]], &Device::Cpu).unwrap();
        let normalized: Vec<Vec<f32>> = l2_normalize(&t).unwrap().to_vec2().unwrap();
        assert_eq!(normalized, vec![vec![0.0, 0.0]]);
    }
}
