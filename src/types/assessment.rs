//! Risk assessment output types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Risk tier classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    /// Determine the tier from an ensemble probability and thresholds.
    /// A probability equal to a bound belongs to the upper tier.
    pub fn from_probability(probability: f64, thresholds: &TierThresholds) -> Self {
        if probability >= thresholds.high {
            RiskTier::High
        } else if probability >= thresholds.moderate {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }
}

/// Configurable tier lower bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierThresholds {
    pub moderate: f64,
    pub high: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.3,
            high: 0.7,
        }
    }
}

/// Result of a single ensemble inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleResult {
    /// Ensemble risk as a percentage (0-100, two decimals)
    pub risk_percentage: f64,

    /// Risk tier classification
    pub risk_level: RiskTier,

    /// Weighted ensemble probability (four decimals)
    pub ensemble_probability: f64,

    /// Per-model probabilities (four decimals)
    pub model_predictions: BTreeMap<String, f64>,

    /// Mirror of the per-model probabilities, kept for API compatibility
    pub confidence_scores: BTreeMap<String, f64>,

    /// Computation timestamp
    pub timestamp: DateTime<Utc>,
}

impl EnsembleResult {
    /// Assemble a result from the raw ensemble probability and per-model
    /// scores. The tier is classified on the unrounded probability.
    pub fn new(
        probability: f64,
        model_scores: BTreeMap<String, f64>,
        thresholds: &TierThresholds,
    ) -> Self {
        let risk_level = RiskTier::from_probability(probability, thresholds);
        let rounded: BTreeMap<String, f64> = model_scores
            .into_iter()
            .map(|(name, score)| (name, round4(score)))
            .collect();

        Self {
            risk_percentage: round2(probability * 100.0),
            risk_level,
            ensemble_probability: round4(probability),
            model_predictions: rounded.clone(),
            confidence_scores: rounded,
            timestamp: Utc::now(),
        }
    }
}

/// Round to two decimal places
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to four decimal places
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let thresholds = TierThresholds::default();

        assert_eq!(
            RiskTier::from_probability(0.2999, &thresholds),
            RiskTier::Low
        );
        assert_eq!(
            RiskTier::from_probability(0.30, &thresholds),
            RiskTier::Moderate
        );
        assert_eq!(
            RiskTier::from_probability(0.6999, &thresholds),
            RiskTier::Moderate
        );
        assert_eq!(
            RiskTier::from_probability(0.70, &thresholds),
            RiskTier::High
        );
    }

    #[test]
    fn test_result_rounding() {
        let mut scores = BTreeMap::new();
        scores.insert("svm".to_string(), 0.123456);

        let result = EnsembleResult::new(0.654321, scores, &TierThresholds::default());

        assert_eq!(result.ensemble_probability, 0.6543);
        assert_eq!(result.risk_percentage, 65.43);
        assert_eq!(result.model_predictions["svm"], 0.1235);
        assert_eq!(result.risk_level, RiskTier::Moderate);
    }

    #[test]
    fn test_rounding_is_idempotent() {
        let once = round4(0.123456789);
        assert_eq!(round4(once), once);

        let pct = round2(65.43219);
        assert_eq!(round2(pct), pct);
    }

    #[test]
    fn test_result_serialization_contract() {
        let mut scores = BTreeMap::new();
        scores.insert("svm".to_string(), 0.8);

        let result = EnsembleResult::new(0.75, scores, &TierThresholds::default());
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["risk_level"], "high");
        assert!(json.get("risk_percentage").is_some());
        assert!(json.get("ensemble_probability").is_some());
        assert!(json.get("model_predictions").is_some());
        assert!(json.get("confidence_scores").is_some());
        assert!(json.get("timestamp").is_some());

        let deserialized: EnsembleResult = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized.risk_level, RiskTier::High);
        assert_eq!(deserialized.ensemble_probability, 0.75);
    }
}
