//! Registry of classifier handles, resolved once at startup

use crate::models::loader::{ModelLoader, TrainedModel};
use crate::models::mock::MockModel;
use crate::scaler::FeatureScaler;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Fixed set of ensemble member names.
pub const MODEL_NAMES: [&str; 4] = ["svm", "random_forest", "gradient_boosting", "neural_network"];

/// Conventional artifact filename per member.
const MODEL_FILES: [(&str, &str); 4] = [
    ("svm", "svm_model.onnx"),
    ("random_forest", "rf_model.onnx"),
    ("gradient_boosting", "gb_model.onnx"),
    ("neural_network", "nn_model.onnx"),
];

/// Scaler artifact filename.
const SCALER_FILE: &str = "scaler.json";

/// A classifier capability: given a scaled feature vector, produce a
/// probability that the positive class applies. Resolved to trained or
/// mock once at registry construction; never rebound afterwards.
pub enum ModelHandle {
    /// Delegates to a pretrained ONNX session
    Trained(TrainedModel),
    /// Deterministic stand-in for an unavailable artifact
    Mock(MockModel),
}

impl ModelHandle {
    /// Whether the handle can produce class probabilities directly.
    pub fn has_probability_output(&self) -> bool {
        match self {
            ModelHandle::Trained(model) => model.has_probability_output(),
            ModelHandle::Mock(_) => true,
        }
    }

    /// Positive-class probability in [0, 1].
    pub fn predict_proba(&self, features: &[f32]) -> Result<f64> {
        match self {
            ModelHandle::Trained(model) => model.predict_proba(features),
            ModelHandle::Mock(mock) => mock.predict_proba(features),
        }
    }

    /// Binary class decision.
    pub fn predict(&self, features: &[f32]) -> Result<i32> {
        match self {
            ModelHandle::Trained(model) => model.predict(features),
            ModelHandle::Mock(mock) => Ok(mock.predict(features)),
        }
    }

    /// Whether this handle is a deterministic stand-in.
    pub fn is_mock(&self) -> bool {
        matches!(self, ModelHandle::Mock(_))
    }
}

/// Optional artifact locations handed to the registry at initialization.
/// Absence of any entry is legal and triggers the mock fallback.
#[derive(Debug, Clone, Default)]
pub struct ModelSources {
    /// Per-member ONNX artifact path
    pub models: BTreeMap<String, PathBuf>,
    /// Fitted scaler artifact path
    pub scaler: Option<PathBuf>,
}

impl ModelSources {
    /// Resolve conventional artifact paths under a models directory,
    /// keeping only the files that exist.
    pub fn from_dir<P: AsRef<Path>>(models_dir: P) -> Self {
        let dir = models_dir.as_ref();
        let mut models = BTreeMap::new();

        for (name, filename) in &MODEL_FILES {
            let path = dir.join(filename);
            if path.exists() {
                models.insert((*name).to_string(), path);
            } else {
                warn!(model = %name, path = %path.display(), "Model artifact not found");
            }
        }

        let scaler_path = dir.join(SCALER_FILE);
        let scaler = scaler_path.exists().then_some(scaler_path);

        Self { models, scaler }
    }
}

/// Named classifier handles plus the shared scaler.
///
/// Fully populated after `initialize`: every configured name is bound to
/// either a trained model or a mock, and the binding is immutable for the
/// process lifetime. Reads need no locking.
pub struct ModelRegistry {
    models: BTreeMap<String, ModelHandle>,
    scaler: FeatureScaler,
}

impl ModelRegistry {
    /// Resolve every configured member against the given sources.
    ///
    /// Loading problems are logged and the affected name is bound to a
    /// mock instead; initialization never fails.
    pub fn initialize(sources: &ModelSources) -> Self {
        let loader = if sources.models.is_empty() {
            None
        } else {
            match ModelLoader::new() {
                Ok(loader) => Some(loader),
                Err(e) => {
                    warn!(error = %e, "ONNX runtime unavailable, all members will be mocked");
                    None
                }
            }
        };

        let mut models = BTreeMap::new();
        for name in MODEL_NAMES {
            let handle = sources
                .models
                .get(name)
                .and_then(|path| {
                    let loader = loader.as_ref()?;
                    match loader.load_model(path, name) {
                        Ok(model) => Some(ModelHandle::Trained(model)),
                        Err(e) => {
                            warn!(model = %name, error = %e, "Failed to load model, using mock");
                            None
                        }
                    }
                })
                .unwrap_or_else(|| {
                    info!(model = %name, "Created mock model");
                    ModelHandle::Mock(MockModel::new())
                });
            models.insert(name.to_string(), handle);
        }

        let scaler = match &sources.scaler {
            Some(path) => match FeatureScaler::load(path) {
                Ok(scaler) => scaler,
                Err(e) => {
                    warn!(error = %e, "Failed to load scaler, using passthrough");
                    FeatureScaler::Passthrough
                }
            },
            None => {
                info!("No scaler artifact configured, using passthrough");
                FeatureScaler::Passthrough
            }
        };

        info!(count = models.len(), "Model registry initialized");

        Self { models, scaler }
    }

    /// Build a registry from preconstructed handles. Used by callers that
    /// load artifacts themselves and by deterministic test fixtures.
    pub fn from_handles(models: BTreeMap<String, ModelHandle>, scaler: FeatureScaler) -> Self {
        Self { models, scaler }
    }

    /// Registry with every member mocked and a passthrough scaler.
    pub fn all_mock() -> Self {
        Self::initialize(&ModelSources::default())
    }

    /// The registered handles, keyed by member name.
    pub fn models(&self) -> &BTreeMap<String, ModelHandle> {
        &self.models
    }

    /// The shared feature scaler.
    pub fn scaler(&self) -> &FeatureScaler {
        &self.scaler
    }

    /// Get the number of registered members.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Get registered member names.
    pub fn model_names(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    /// Whether the named member is bound to a mock.
    pub fn is_mock(&self, name: &str) -> bool {
        self.models.get(name).map(ModelHandle::is_mock).unwrap_or(false)
    }
}
