//! Patient record consumed by the risk engine

use serde::{Deserialize, Serialize};

/// A patient record whose fields have already been range-validated by the
/// caller. Field order matches the training schema consumed by the scaler
/// and every registered model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years
    pub age: f64,

    /// Sex (0 = female, 1 = male)
    pub sex: i32,

    /// Chest pain type (0 = typical angina .. 3 = asymptomatic)
    pub cp: i32,

    /// Resting blood pressure (mm Hg)
    pub trestbps: f64,

    /// Serum cholesterol (mg/dl)
    pub chol: f64,

    /// Fasting blood sugar > 120 mg/dl (0/1)
    pub fbs: i32,

    /// Resting ECG category (0 = normal, 1 = ST-T abnormality, 2 = LV hypertrophy)
    pub restecg: i32,

    /// Maximum heart rate achieved
    pub thalach: f64,

    /// Exercise-induced angina (0/1)
    pub exang: i32,

    /// ST depression induced by exercise relative to rest
    pub oldpeak: f64,

    /// Slope of the peak exercise ST segment (0..2)
    pub slope: i32,

    /// Number of major vessels colored by fluoroscopy (0..4)
    pub ca: i32,

    /// Thalassemia category (0..3)
    pub thal: i32,
}
