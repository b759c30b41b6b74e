//! ML model components: classifier, artifact loading, scoring, evaluation

pub mod evaluation;
pub mod forest;
pub mod inference;
pub mod loader;

pub use forest::{ForestParams, RandomForest};
pub use inference::ScoringService;
pub use loader::{ModelArtifact, ModelLoader};
