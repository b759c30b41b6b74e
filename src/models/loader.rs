//! Model artifact format and loader

use crate::error::{ScoringError, ScoringResult};
use crate::feature_extractor::{FEATURE_COLUMNS, FEATURE_SCHEMA_VERSION};
use crate::models::forest::RandomForest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Serialized classifier plus the header needed to check it before use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Feature layout version the forest was fit with
    pub schema_version: u32,
    /// Ordered feature names the forest was fit with
    pub feature_names: Vec<String>,
    /// When the forest was fit
    pub trained_at: DateTime<Utc>,
    /// The fitted classifier
    pub forest: RandomForest,
}

impl ModelArtifact {
    /// Wrap a forest fit on the current feature layout.
    pub fn new(forest: RandomForest) -> Self {
        Self {
            schema_version: FEATURE_SCHEMA_VERSION,
            feature_names: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
            trained_at: Utc::now(),
            forest,
        }
    }

    /// Check the header against [`FEATURE_COLUMNS`] and the forest structure.
    pub fn validate(&self) -> ScoringResult<()> {
        let names_match = self.feature_names.len() == FEATURE_COLUMNS.len()
            && self
                .feature_names
                .iter()
                .zip(FEATURE_COLUMNS.iter())
                .all(|(a, b)| a == b);

        if self.schema_version != FEATURE_SCHEMA_VERSION || !names_match {
            return Err(ScoringError::SchemaMismatch {
                expected_version: FEATURE_SCHEMA_VERSION,
                expected: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
                found_version: self.schema_version,
                found: self.feature_names.clone(),
            });
        }

        if self.forest.n_features() != FEATURE_COLUMNS.len() {
            return Err(ScoringError::FeatureCount {
                expected: FEATURE_COLUMNS.len(),
                found: self.forest.n_features(),
            });
        }

        self.forest.validate().map_err(ScoringError::ArtifactShape)
    }
}

/// Reads and writes model artifacts
pub struct ModelLoader;

impl ModelLoader {
    /// Create a new model loader
    pub fn new() -> Self {
        Self
    }

    /// Load an artifact from file. The header is not validated here.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> ScoringResult<ModelArtifact> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScoringError::ModelNotFound(path.to_path_buf()));
        }

        info!(path = %path.display(), "Loading model artifact");

        let bytes = fs::read(path)?;
        let artifact: ModelArtifact =
            bincode::deserialize(&bytes).map_err(|e| ScoringError::decode(path, e))?;

        info!(
            path = %path.display(),
            schema_version = artifact.schema_version,
            trees = artifact.forest.n_trees(),
            trained_at = %artifact.trained_at,
            "Model artifact loaded"
        );

        Ok(artifact)
    }

    /// Write an artifact, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, artifact: &ModelArtifact, path: P) -> ScoringResult<()> {
        let path = path.as_ref();

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let bytes = bincode::serialize(artifact).map_err(|e| ScoringError::write(path, e))?;
        fs::write(path, &bytes)?;

        info!(
            path = %path.display(),
            bytes = bytes.len(),
            trees = artifact.forest.n_trees(),
            "Model artifact saved"
        );

        Ok(())
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}
