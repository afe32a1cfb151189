//! Feature standardization applied before model inference

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Fitted standardization parameters, one entry per feature.
///
/// Written by the training pipeline as `scaler.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    /// Per-feature mean
    pub mean: Vec<f64>,
    /// Per-feature spread
    pub scale: Vec<f64>,
}

/// The shared scaler owned by the model registry.
#[derive(Debug, Clone)]
pub enum FeatureScaler {
    /// Standardize with fitted per-feature mean and spread
    Standard(ScalerParams),
    /// Identity transform bound when no fitted scaler is available
    Passthrough,
}

impl FeatureScaler {
    /// Load fitted parameters from a JSON artifact.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scaler artifact {:?}", path))?;
        let params: ScalerParams = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scaler artifact {:?}", path))?;

        if params.mean.len() != params.scale.len() {
            anyhow::bail!(
                "Scaler artifact {:?} has {} means but {} scales",
                path,
                params.mean.len(),
                params.scale.len()
            );
        }

        info!(
            path = %path.display(),
            features = params.mean.len(),
            "Loaded fitted scaler"
        );

        Ok(FeatureScaler::Standard(params))
    }

    /// Apply the transform. Fails when the fitted parameter count does not
    /// match the vector length.
    pub fn transform(&self, features: &[f32]) -> Result<Vec<f32>> {
        match self {
            FeatureScaler::Standard(params) => {
                if features.len() != params.mean.len() {
                    anyhow::bail!(
                        "Feature count {} does not match fitted scaler ({} features)",
                        features.len(),
                        params.mean.len()
                    );
                }

                Ok(features
                    .iter()
                    .zip(params.mean.iter().zip(params.scale.iter()))
                    .map(|(&value, (&mean, &scale))| {
                        // A constant feature has zero spread; divide by 1 like
                        // the training scaler does.
                        let spread = if scale == 0.0 { 1.0 } else { scale };
                        ((value as f64 - mean) / spread) as f32
                    })
                    .collect())
            }
            FeatureScaler::Passthrough => Ok(features.to_vec()),
        }
    }

    /// Whether this is the identity fallback.
    pub fn is_passthrough(&self) -> bool {
        matches!(self, FeatureScaler::Passthrough)
    }
}
