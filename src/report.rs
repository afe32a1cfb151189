//! Batch scoring reports

use crate::types::assessment::{round2, EnsembleResult, RiskTier};
use serde::{Deserialize, Serialize};

/// Ordered per-record results plus batch-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Per-record results in input order
    pub predictions: Vec<EnsembleResult>,

    /// Number of records scored
    pub count: usize,

    /// Mean risk percentage across the batch (two decimals, 0.0 when empty)
    pub average_risk: f64,

    /// Records classified as high risk
    pub high_risk_count: usize,

    /// Records classified as moderate risk
    pub moderate_risk_count: usize,

    /// Records classified as low risk
    pub low_risk_count: usize,
}

impl BatchSummary {
    /// Fold per-record results into a summary. Purely derived; an empty
    /// batch yields a defined, zeroed summary.
    pub fn from_results(predictions: Vec<EnsembleResult>) -> Self {
        let count = predictions.len();

        let average_risk = if count == 0 {
            0.0
        } else {
            round2(predictions.iter().map(|p| p.risk_percentage).sum::<f64>() / count as f64)
        };

        let high_risk_count = predictions
            .iter()
            .filter(|p| p.risk_level == RiskTier::High)
            .count();
        let moderate_risk_count = predictions
            .iter()
            .filter(|p| p.risk_level == RiskTier::Moderate)
            .count();
        let low_risk_count = predictions
            .iter()
            .filter(|p| p.risk_level == RiskTier::Low)
            .count();

        Self {
            predictions,
            count,
            average_risk,
            high_risk_count,
            moderate_risk_count,
            low_risk_count,
        }
    }
}
