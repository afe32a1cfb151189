//! Feature vector assembly for risk model inference.
//!
//! Builds the fixed-order vector that the fitted scaler and every
//! registered model expect.

use crate::scaler::FeatureScaler;
use crate::types::patient::PatientRecord;
use tracing::warn;

/// Number of features in the model input schema.
pub const FEATURE_COUNT: usize = 13;

/// Builds scaled model input vectors from validated patient records.
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Create a new feature builder.
    pub fn new() -> Self {
        Self
    }

    /// Assemble the features in training order and apply the shared scaler.
    ///
    /// When the transform fails the unscaled vector is returned so the
    /// request can still be served.
    pub fn build(&self, record: &PatientRecord, scaler: &FeatureScaler) -> Vec<f32> {
        let features = self.raw_features(record);

        match scaler.transform(&features) {
            Ok(scaled) => scaled,
            Err(e) => {
                warn!(error = %e, "Scaler transform failed, using unscaled features");
                features
            }
        }
    }

    /// The unscaled feature vector in training order.
    pub fn raw_features(&self, record: &PatientRecord) -> Vec<f32> {
        vec![
            record.age as f32,
            record.sex as f32,
            record.cp as f32,
            record.trestbps as f32,
            record.chol as f32,
            record.fbs as f32,
            record.restecg as f32,
            record.thalach as f32,
            record.exang as f32,
            record.oldpeak as f32,
            record.slope as f32,
            record.ca as f32,
            record.thal as f32,
        ]
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names in training order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        vec![
            "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang",
            "oldpeak", "slope", "ca", "thal",
        ]
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}
