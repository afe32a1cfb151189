//! CVD Ensemble Risk Engine
//!
//! Scores cardiovascular-disease risk by combining several independently
//! trained classifiers into one probability and a discrete risk tier.
//! Unavailable trained artifacts are replaced by deterministic mocks at
//! initialization, so the engine degrades to fully-mocked-but-operational
//! rather than refusing to serve.

pub mod config;
pub mod ensemble;
pub mod features;
pub mod models;
pub mod report;
pub mod scaler;
pub mod types;

pub use config::EngineConfig;
pub use ensemble::{EnsembleEngine, ModelScore};
pub use features::FeatureBuilder;
pub use models::registry::{ModelHandle, ModelRegistry, ModelSources};
pub use report::BatchSummary;
pub use scaler::FeatureScaler;
pub use types::{EnsembleResult, PatientRecord, RiskTier, TierThresholds};
