//! Type definitions for the risk engine

pub mod assessment;
pub mod patient;

pub use assessment::{EnsembleResult, RiskTier, TierThresholds};
pub use patient::PatientRecord;
