//! Error types for the scoring service.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scoring operations.
pub type ScoringResult<T> = Result<T, ScoringError>;

/// Errors raised while loading or running the classifier.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// No artifact at the configured location.
    #[error("Model not found at path: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// `predict` was called before a model was loaded.
    #[error("Model not loaded")]
    ModelNotLoaded,

    /// The artifact exists but could not be decoded.
    #[error("Failed to decode model artifact {}: {message}", .path.display())]
    ArtifactDecode { path: PathBuf, message: String },

    /// The artifact could not be encoded or written.
    #[error("Failed to write model artifact {}: {message}", .path.display())]
    ArtifactWrite { path: PathBuf, message: String },

    /// The artifact was fit with a different feature layout.
    #[error("Feature schema mismatch: expected v{expected_version} {expected:?}, artifact has v{found_version} {found:?}")]
    SchemaMismatch {
        expected_version: u32,
        expected: Vec<String>,
        found_version: u32,
        found: Vec<String>,
    },

    /// The classifier expects a different input width.
    #[error("Classifier expects {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },

    /// The forest inside the artifact cannot be traversed safely.
    #[error("Malformed model artifact: {0}")]
    ArtifactShape(String),

    /// The classifier produced NaN or an infinite score.
    #[error("Classifier returned a non-finite probability: {0}")]
    NonFiniteProbability(f64),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScoringError {
    /// Create a decode error for an artifact path.
    pub fn decode(path: impl Into<PathBuf>, msg: impl ToString) -> Self {
        Self::ArtifactDecode {
            path: path.into(),
            message: msg.to_string(),
        }
    }

    /// Create a write error for an artifact path.
    pub fn write(path: impl Into<PathBuf>, msg: impl ToString) -> Self {
        Self::ArtifactWrite {
            path: path.into(),
            message: msg.to_string(),
        }
    }

    /// Whether the error means no usable model is available.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound(_)
                | Self::ModelNotLoaded
                | Self::ArtifactDecode { .. }
                | Self::ArtifactShape(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(ScoringError::ModelNotLoaded.to_string(), "Model not loaded");

        let err = ScoringError::ModelNotFound(PathBuf::from("models/credit_model.bin"));
        assert_eq!(
            err.to_string(),
            "Model not found at path: models/credit_model.bin"
        );
        assert!(err.is_unavailable());

        let err = ScoringError::FeatureCount {
            expected: 7,
            found: 5,
        };
        assert!(!err.is_unavailable());
        assert!(err.to_string().contains("expects 7 features"));

        let err = ScoringError::ArtifactShape("forest has no trees".to_string());
        assert_eq!(err.to_string(), "Malformed model artifact: forest has no trees");
        assert!(err.is_unavailable());
        assert!(!ScoringError::NonFiniteProbability(f64::NAN).is_unavailable());
    }
}
