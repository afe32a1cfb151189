//! Configuration for the ensemble risk engine

use crate::types::assessment::TierThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Top-level engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub models: ModelsConfig,
    /// Risk tier lower bounds
    #[serde(default)]
    pub thresholds: TierThresholds,
}

/// Ensemble member configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing model artifacts and the fitted scaler
    #[serde(default = "default_models_dir")]
    pub models_dir: String,
    /// Fixed ensemble weight per member; expected to sum to 1.0
    #[serde(default = "default_weights")]
    pub weights: HashMap<String, f64>,
}

fn default_models_dir() -> String {
    "models".to_string()
}

fn default_weights() -> HashMap<String, f64> {
    let mut weights = HashMap::new();
    weights.insert("svm".to_string(), 0.25);
    weights.insert("random_forest".to_string(), 0.25);
    weights.insert("gradient_boosting".to_string(), 0.30);
    weights.insert("neural_network".to_string(), 0.20);
    weights
}

impl EngineConfig {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/engine.toml")
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            thresholds: TierThresholds::default(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            weights: default_weights(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.models.models_dir, "models");
        assert_eq!(config.models.weights.len(), 4);
        assert_eq!(config.models.weights.get("gradient_boosting"), Some(&0.30));
        assert_eq!(config.thresholds.moderate, 0.3);
        assert_eq!(config.thresholds.high, 0.7);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let total: f64 = default_weights().values().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[models]
models_dir = "artifacts"

[models.weights]
svm = 0.5
random_forest = 0.5

[thresholds]
moderate = 0.25
high = 0.75
"#
        )
        .unwrap();

        let config = EngineConfig::load_from_path(file.path()).unwrap();

        assert_eq!(config.models.models_dir, "artifacts");
        assert_eq!(config.models.weights.len(), 2);
        assert_eq!(config.thresholds.moderate, 0.25);
        assert_eq!(config.thresholds.high, 0.75);
    }
}
