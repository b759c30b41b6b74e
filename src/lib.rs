//! Credit Scoring Library
//!
//! Loan default scoring backed by a random-forest classifier: synthetic data
//! generation, offline training, an HTTP scoring API and a form UI that
//! relays applications to it.

pub mod api;
pub mod config;
pub mod data_gen;
pub mod error;
pub mod feature_extractor;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod training;
pub mod types;
pub mod ui;

pub use config::AppConfig;
pub use error::{ScoringError, ScoringResult};
pub use feature_extractor::FeatureExtractor;
pub use models::inference::ScoringService;
pub use types::{application::LoanApplication, prediction::PredictionResponse};
