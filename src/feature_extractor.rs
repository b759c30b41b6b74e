//! Feature extraction for credit default model inference.
//!
//! The classifier works on positional feature vectors, so the column order
//! below is the contract between training and serving. Any change to it
//! must bump [`FEATURE_SCHEMA_VERSION`]; artifacts carrying another version
//! are refused at load time.

use crate::types::application::LoanApplication;

/// Version of the feature layout stored in every model artifact.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Column order the classifier is fit with.
pub const FEATURE_COLUMNS: [&str; 7] = [
    "age",
    "income",
    "years_employed",
    "credit_limit",
    "credit_utilization",
    "delinquencies_2y",
    "loan_amount",
];

/// Feature extractor that transforms applications into model input features.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract features from an application in [`FEATURE_COLUMNS`] order.
    pub fn extract(&self, app: &LoanApplication) -> Vec<f64> {
        vec![
            app.age as f64,
            app.income as f64,
            app.years_employed as f64,
            app.credit_limit as f64,
            app.credit_utilization,
            app.delinquencies_2y as f64,
            app.loan_amount as f64,
        ]
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COLUMNS.len()
    }

    /// Get feature names in extraction order.
    pub fn feature_names(&self) -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
