//! Weighted ensemble scoring engine

use crate::config::EngineConfig;
use crate::features::FeatureBuilder;
use crate::models::registry::ModelRegistry;
use crate::report::BatchSummary;
use crate::types::assessment::{EnsembleResult, TierThresholds};
use crate::types::patient::PatientRecord;
use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Per-model scoring outcome. Keeps the recovery path explicit so callers
/// and tests can tell a genuine prediction from a substituted value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelScore {
    /// The model's probability interface succeeded
    Probability(f64),
    /// The model only exposes a binary decision; the 0/1 class is used
    Decision(f64),
    /// The model call failed; deterministic substitute derived from the input
    Fallback(f64),
}

impl ModelScore {
    /// The probability carried by this score.
    pub fn value(&self) -> f64 {
        match *self {
            ModelScore::Probability(v) | ModelScore::Decision(v) | ModelScore::Fallback(v) => v,
        }
    }

    /// Whether the score came from the failure-recovery path.
    pub fn is_fallback(&self) -> bool {
        matches!(self, ModelScore::Fallback(_))
    }
}

/// Ensemble inference engine combining every registered model with fixed
/// weights. Holds shared read-only state; one instance serves any number
/// of concurrent inference calls.
pub struct EnsembleEngine {
    registry: ModelRegistry,
    builder: FeatureBuilder,
    weights: HashMap<String, f64>,
    thresholds: TierThresholds,
}

impl EnsembleEngine {
    /// Create an engine over an initialized registry.
    pub fn new(registry: ModelRegistry, config: &EngineConfig) -> Self {
        Self {
            registry,
            builder: FeatureBuilder::new(),
            weights: config.models.weights.clone(),
            thresholds: config.thresholds.clone(),
        }
    }

    /// The registry backing this engine.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Score a single scaled feature vector.
    ///
    /// Per-model failures are recovered internally; the only error surfaced
    /// is a misconfigured weight table.
    pub fn score(&self, features: &[f32]) -> Result<EnsembleResult> {
        self.check_weights()?;

        let scores = self.collect_scores(features);
        let probability = self.combine(&scores);

        debug!(probability = probability, scores = ?scores, "Ensemble inference complete");

        let raw: BTreeMap<String, f64> = scores
            .into_iter()
            .map(|(name, score)| (name, score.value()))
            .collect();

        Ok(EnsembleResult::new(probability, raw, &self.thresholds))
    }

    /// Build features from a validated record and score them.
    pub fn assess(&self, record: &PatientRecord) -> Result<EnsembleResult> {
        let features = self.builder.build(record, self.registry.scaler());
        self.score(&features)
    }

    /// Score a batch of feature vectors, one result per input, in order.
    pub fn score_batch(&self, batch: &[Vec<f32>]) -> Result<Vec<EnsembleResult>> {
        batch.iter().map(|features| self.score(features)).collect()
    }

    /// Score each vector in order and fold the results into a summary.
    pub fn summarize(&self, batch: &[Vec<f32>]) -> Result<BatchSummary> {
        Ok(BatchSummary::from_results(self.score_batch(batch)?))
    }

    /// Record-level batch surface: build features per record, then summarize.
    pub fn summarize_records(&self, records: &[PatientRecord]) -> Result<BatchSummary> {
        let batch: Vec<Vec<f32>> = records
            .iter()
            .map(|record| self.builder.build(record, self.registry.scaler()))
            .collect();
        self.summarize(&batch)
    }

    /// Query every registered model, isolating per-model failures behind
    /// the deterministic fallback score.
    pub(crate) fn collect_scores(&self, features: &[f32]) -> BTreeMap<String, ModelScore> {
        let mut scores = BTreeMap::new();

        for (name, handle) in self.registry.models() {
            let attempted = if handle.has_probability_output() {
                handle.predict_proba(features).map(ModelScore::Probability)
            } else {
                handle
                    .predict(features)
                    .map(|class| ModelScore::Decision(class as f64))
            };

            let score = attempted.unwrap_or_else(|e| {
                warn!(model = %name, error = %e, "Model inference failed, using fallback score");
                ModelScore::Fallback(fallback_probability(features))
            });

            scores.insert(name.clone(), score);
        }

        scores
    }

    /// Fixed-weight sum over the weight table. Table names missing from the
    /// registry are skipped; registry members without a weight contribute
    /// nothing.
    pub(crate) fn combine(&self, scores: &BTreeMap<String, ModelScore>) -> f64 {
        self.weights
            .iter()
            .map(|(name, weight)| {
                scores.get(name).map(ModelScore::value).unwrap_or(0.0) * weight
            })
            .sum()
    }

    fn check_weights(&self) -> Result<()> {
        let total: f64 = self.weights.values().sum();
        if self.weights.is_empty() || total <= 0.0 {
            anyhow::bail!("Ensemble weight table is empty or sums to zero");
        }
        Ok(())
    }
}

/// Deterministic substitute used when a model call fails: the fractional
/// part of the feature sum, clamped away from the ends of the unit
/// interval. Euclidean remainder keeps negative sums non-negative.
pub(crate) fn fallback_probability(features: &[f32]) -> f64 {
    let sum: f64 = features.iter().map(|&x| x as f64).sum();
    sum.rem_euclid(1.0).clamp(0.01, 0.99)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mock::MockModel;
    use crate::models::registry::ModelHandle;
    use crate::scaler::FeatureScaler;
    use crate::types::assessment::{round4, RiskTier};

    fn mock_engine() -> EnsembleEngine {
        EnsembleEngine::new(ModelRegistry::all_mock(), &EngineConfig::default())
    }

    #[test]
    fn test_weighted_sum_is_exact() {
        let engine = mock_engine();

        let mut scores = BTreeMap::new();
        scores.insert("svm".to_string(), ModelScore::Probability(0.8));
        scores.insert("random_forest".to_string(), ModelScore::Probability(0.6));
        scores.insert("gradient_boosting".to_string(), ModelScore::Probability(0.4));
        scores.insert("neural_network".to_string(), ModelScore::Decision(1.0));

        let combined = engine.combine(&scores);

        // 0.8*0.25 + 0.6*0.25 + 0.4*0.30 + 1.0*0.20 = 0.67
        assert!((combined - 0.67).abs() < 1e-12);
    }

    #[test]
    fn test_registry_member_without_weight_contributes_nothing() {
        let mut models = BTreeMap::new();
        models.insert("svm".to_string(), ModelHandle::Mock(MockModel::new()));
        models.insert("extra".to_string(), ModelHandle::Mock(MockModel::new()));
        let registry = ModelRegistry::from_handles(models, FeatureScaler::Passthrough);

        let engine = EnsembleEngine::new(registry, &EngineConfig::default());

        let mut scores = BTreeMap::new();
        scores.insert("svm".to_string(), ModelScore::Probability(0.4));
        scores.insert("extra".to_string(), ModelScore::Probability(1.0));

        // Only the weighted member counts: 0.4 * 0.25.
        assert!((engine.combine(&scores) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_weight_table_name_missing_from_registry_is_skipped() {
        let engine = mock_engine();

        let mut scores = BTreeMap::new();
        scores.insert("svm".to_string(), ModelScore::Probability(0.4));

        // The other three weighted names are absent from the score map.
        assert!((engine.combine(&scores) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_empty_weight_table_is_a_configuration_error() {
        let mut config = EngineConfig::default();
        config.models.weights.clear();

        let engine = EnsembleEngine::new(ModelRegistry::all_mock(), &config);
        assert!(engine.score(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_zero_sum_weight_table_is_a_configuration_error() {
        let mut config = EngineConfig::default();
        for weight in config.models.weights.values_mut() {
            *weight = 0.0;
        }

        let engine = EnsembleEngine::new(ModelRegistry::all_mock(), &config);
        assert!(engine.score(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_all_mock_scoring_is_deterministic() {
        let engine = mock_engine();
        let features = [
            63.0, 1.0, 3.0, 145.0, 233.0, 1.0, 0.0, 150.0, 0.0, 2.3, 0.0, 0.0, 1.0,
        ];

        let first = engine.score(&features).unwrap();
        let second = engine.score(&features).unwrap();

        assert_eq!(first.ensemble_probability, second.ensemble_probability);
        assert_eq!(first.risk_level, second.risk_level);
        assert_eq!(first.model_predictions, second.model_predictions);
    }

    #[test]
    fn test_all_mock_ensemble_equals_weighted_mock_probability() {
        let engine = mock_engine();
        let features = [
            63.0, 1.0, 3.0, 145.0, 233.0, 1.0, 0.0, 150.0, 0.0, 2.3, 0.0, 0.0, 1.0,
        ];

        // Every member is the same mock, so with weights summing to 1.0 the
        // ensemble probability must equal the mock probability itself.
        let mock_prob = MockModel::new().predict_proba(&features).unwrap();
        let result = engine.score(&features).unwrap();

        assert_eq!(result.ensemble_probability, round4(mock_prob));
        assert!(result.ensemble_probability >= 0.0 && result.ensemble_probability <= 1.0);
        assert_eq!(result.risk_level, RiskTier::High);
    }

    #[test]
    fn test_model_failure_takes_fallback_path() {
        let engine = mock_engine();

        // Mocks reject an empty vector, so every member recovers through
        // the deterministic fallback: clamp(0.0 mod 1.0, 0.01, 0.99).
        let scores = engine.collect_scores(&[]);

        assert_eq!(scores.len(), 4);
        for score in scores.values() {
            assert!(score.is_fallback());
            assert_eq!(score.value(), 0.01);
        }

        let result = engine.score(&[]).unwrap();
        assert_eq!(result.ensemble_probability, 0.01);
        assert_eq!(result.risk_level, RiskTier::Low);
    }

    #[test]
    fn test_successful_mocks_report_probability_path() {
        let engine = mock_engine();
        let scores = engine.collect_scores(&[1.0, 2.0, 3.0]);

        assert!(scores.values().all(|s| matches!(s, ModelScore::Probability(_))));
    }

    #[test]
    fn test_fallback_probability_formula() {
        // Fractional part of the sum.
        assert!((fallback_probability(&[2.5]) - 0.5).abs() < 1e-12);
        // Euclidean remainder of a negative sum.
        assert!((fallback_probability(&[-0.75]) - 0.25).abs() < 1e-12);
        // Integer sums land on 0.0 and clamp to the lower bound.
        assert_eq!(fallback_probability(&[5.0]), 0.01);
        assert_eq!(fallback_probability(&[]), 0.01);
    }

    #[test]
    fn test_assess_builds_and_scores() {
        let engine = mock_engine();
        let record = PatientRecord {
            age: 63.0,
            sex: 1,
            cp: 3,
            trestbps: 145.0,
            chol: 233.0,
            fbs: 1,
            restecg: 0,
            thalach: 150.0,
            exang: 0,
            oldpeak: 2.3,
            slope: 0,
            ca: 0,
            thal: 1,
        };

        let result = engine.assess(&record).unwrap();
        assert_eq!(result.model_predictions.len(), 4);
        assert!(result.ensemble_probability > 0.0 && result.ensemble_probability < 1.0);
    }
}
