//! Configuration management for the credit scoring service

use crate::models::forest::ForestParams;
use crate::types::prediction::DEFAULT_DECISION_THRESHOLD;
use crate::ui::DEFAULT_API_URL;
use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default location of the optional configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub decision: DecisionConfig,
    pub data: DataConfig,
    pub training: TrainingConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// HTTP API listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Model artifact location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path of the serialized classifier
    pub path: String,
}

/// Decision policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Probabilities strictly above this are rejected
    pub threshold: f64,
}

/// Synthetic dataset generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV written by the generator and read by the trainer
    pub dataset_path: String,
    pub n_samples: usize,
    pub seed: u64,
}

/// Classifier fitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    pub seed: u64,
}

impl TrainingConfig {
    /// Forest hyper-parameters for this configuration
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: None,
            seed: self.seed,
        }
    }
}

/// Form UI relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub host: String,
    pub port: u16,
    /// Scoring API base URL; the `API_URL` environment variable wins
    pub api_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

/// Metrics reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between logged summaries; 0 disables the reporter
    pub report_interval_secs: u64,
}

impl AppConfig {
    /// Load configuration from the default file location
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path.
    ///
    /// Built-in defaults are overlaid by the file (if it exists) and then by
    /// `CREDIT_SCORING_<SECTION>__<KEY>` environment variables.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults =
            Config::try_from(&AppConfig::default()).context("Failed to encode default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("CREDIT_SCORING")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.decision.threshold),
            "decision.threshold must be within [0, 1], got {}",
            self.decision.threshold
        );
        ensure!(
            self.training.test_size > 0.0 && self.training.test_size < 1.0,
            "training.test_size must be within (0, 1), got {}",
            self.training.test_size
        );
        ensure!(self.training.n_estimators > 0, "training.n_estimators must be positive");
        ensure!(self.training.max_depth > 0, "training.max_depth must be positive");
        ensure!(self.data.n_samples > 0, "data.n_samples must be positive");
        ensure!(
            matches!(self.logging.format.as_str(), "json" | "pretty"),
            "logging.format must be \"json\" or \"pretty\", got {:?}",
            self.logging.format
        );
        Ok(())
    }

    /// Address the API binds to
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Address the UI binds to
    pub fn ui_addr(&self) -> String {
        format!("{}:{}", self.ui.host, self.ui.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            model: ModelConfig {
                path: "models/credit_model.bin".to_string(),
            },
            decision: DecisionConfig {
                threshold: DEFAULT_DECISION_THRESHOLD,
            },
            data: DataConfig {
                dataset_path: "data/credit_risk_dataset.csv".to_string(),
                n_samples: 5000,
                seed: 42,
            },
            training: TrainingConfig {
                n_estimators: 100,
                max_depth: 10,
                min_samples_split: 2,
                min_samples_leaf: 1,
                test_size: 0.2,
                seed: 42,
            },
            ui: UiConfig {
                host: "127.0.0.1".to_string(),
                port: 8501,
                api_url: DEFAULT_API_URL.to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            metrics: MetricsConfig {
                report_interval_secs: 60,
            },
        }
    }
}
