//! Scoring service: holds the loaded classifier and turns applications
//! into default probabilities.

use crate::error::{ScoringError, ScoringResult};
use crate::feature_extractor::{FeatureExtractor, FEATURE_SCHEMA_VERSION};
use crate::models::loader::{ModelArtifact, ModelLoader};
use crate::types::application::LoanApplication;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Summary of the loaded model, reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    pub trees: usize,
    pub max_depth: usize,
    pub trained_at: DateTime<Utc>,
}

/// Long-lived scoring handle.
///
/// Built once at startup, loaded once, then shared read-only between
/// request handlers.
pub struct ScoringService {
    model: Option<ModelArtifact>,
    extractor: FeatureExtractor,
}

impl ScoringService {
    /// Create a service with no model loaded.
    pub fn new() -> Self {
        Self {
            model: None,
            extractor: FeatureExtractor::new(),
        }
    }

    /// Create a service from an in-memory artifact.
    pub fn from_artifact(artifact: ModelArtifact) -> ScoringResult<Self> {
        let mut service = Self::new();
        service.install(artifact)?;
        Ok(service)
    }

    /// Load the artifact at `path`, failing fast on a schema mismatch.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> ScoringResult<()> {
        let artifact = ModelLoader::new().load(path)?;
        self.install(artifact)
    }

    fn install(&mut self, artifact: ModelArtifact) -> ScoringResult<()> {
        artifact.validate()?;
        info!(
            schema_version = FEATURE_SCHEMA_VERSION,
            features = self.extractor.feature_count(),
            trees = artifact.forest.n_trees(),
            "Scoring service ready"
        );
        self.model = Some(artifact);
        Ok(())
    }

    /// Whether a model is loaded.
    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Describe the loaded model, if any.
    pub fn model_info(&self) -> Option<ModelInfo> {
        self.model.as_ref().map(|m| ModelInfo {
            schema_version: m.schema_version,
            feature_names: m.feature_names.clone(),
            trees: m.forest.n_trees(),
            max_depth: m.forest.params().max_depth,
            trained_at: m.trained_at,
        })
    }

    /// Probability that the applicant defaults.
    pub fn predict(&self, app: &LoanApplication) -> ScoringResult<f64> {
        let model = self.model.as_ref().ok_or(ScoringError::ModelNotLoaded)?;

        let features = self.extractor.extract(app);
        if features.len() != model.forest.n_features() {
            return Err(ScoringError::FeatureCount {
                expected: model.forest.n_features(),
                found: features.len(),
            });
        }

        let probability = model.forest.predict_proba(&features);
        if !probability.is_finite() {
            return Err(ScoringError::NonFiniteProbability(probability));
        }
        debug!(probability = probability, "Scored application");

        Ok(probability)
    }
}

impl Default for ScoringService {
    fn default() -> Self {
        Self::new()
    }
}
