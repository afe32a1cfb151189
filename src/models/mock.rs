//! Deterministic stand-in models

use anyhow::Result;

const EPSILON: f64 = 1e-6;

/// Deterministic fallback bound to a member whose trained artifact could
/// not be loaded. Produces a bounded pseudo-probability purely as a
/// function of the input, so the engine stays fully operational with zero
/// real models present.
#[derive(Debug, Clone, Default)]
pub struct MockModel;

impl MockModel {
    /// Create a new mock model.
    pub fn new() -> Self {
        Self
    }

    /// Positive-class probability in (0, 1):
    /// `(tanh(sum / (max|x| + eps)) + 1) / 2`.
    ///
    /// Errors on an empty vector; the max of nothing is undefined.
    pub fn predict_proba(&self, features: &[f32]) -> Result<f64> {
        if features.is_empty() {
            anyhow::bail!("Cannot score an empty feature vector");
        }

        let sum: f64 = features.iter().map(|&x| x as f64).sum();
        let max_abs = features
            .iter()
            .map(|&x| (x as f64).abs())
            .fold(0.0, f64::max);

        let s = (sum / (max_abs + EPSILON)).tanh();
        Ok((s + 1.0) / 2.0)
    }

    /// Binary decision: 1 when the feature sum is positive.
    pub fn predict(&self, features: &[f32]) -> i32 {
        let sum: f64 = features.iter().map(|&x| x as f64).sum();
        if sum > 0.0 {
            1
        } else {
            0
        }
    }
}
