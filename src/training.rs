//! Offline training pipeline: CSV in, evaluated artifact out.

use crate::config::TrainingConfig;
use crate::feature_extractor::FeatureExtractor;
use crate::models::evaluation::{roc_auc, ClassificationReport};
use crate::models::forest::RandomForest;
use crate::models::loader::{ModelArtifact, ModelLoader};
use crate::types::record::CreditRecord;
use anyhow::{bail, ensure, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub report: ClassificationReport,
    /// `None` when the test split holds a single class
    pub roc_auc: Option<f64>,
}

/// Read the labeled dataset.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Vec<CreditRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        bail!("Dataset not found at path: {}", path.display());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<CreditRecord>, _>>()
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    info!(path = %path.display(), rows = records.len(), "Dataset loaded");
    Ok(records)
}

/// Shuffle row indices and split off a test set of ceil(n * test_size) rows.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let n_test = ((n as f64) * test_size).ceil() as usize;
    let train = indices.split_off(n_test.min(n));
    (train, indices)
}

/// Fit and evaluate a forest on `records`.
pub fn fit(records: &[CreditRecord], config: &TrainingConfig) -> Result<(RandomForest, TrainingReport)> {
    ensure!(records.len() >= 2, "need at least two rows to train, got {}", records.len());

    let extractor = FeatureExtractor::new();
    let x: Vec<Vec<f64>> = records
        .iter()
        .map(|r| extractor.extract(&r.application()))
        .collect();
    let y: Vec<u8> = records.iter().map(|r| r.default).collect();

    let (train_idx, test_idx) = train_test_split(records.len(), config.test_size, config.seed);
    ensure!(!train_idx.is_empty(), "training split is empty");

    let x_train: Vec<Vec<f64>> = train_idx.iter().map(|&i| x[i].clone()).collect();
    let y_train: Vec<u8> = train_idx.iter().map(|&i| y[i]).collect();

    info!(
        train_rows = train_idx.len(),
        test_rows = test_idx.len(),
        trees = config.n_estimators,
        max_depth = config.max_depth,
        "Training random forest"
    );
    let start = Instant::now();
    let forest = RandomForest::fit(&x_train, &y_train, config.forest_params())?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Forest fitted");

    let y_test: Vec<u8> = test_idx.iter().map(|&i| y[i]).collect();
    let scores: Vec<f64> = test_idx.iter().map(|&i| forest.predict_proba(&x[i])).collect();
    let y_pred: Vec<u8> = scores.iter().map(|&p| u8::from(p > 0.5)).collect();

    let report = TrainingReport {
        rows: records.len(),
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
        report: ClassificationReport::new(&y_test, &y_pred),
        roc_auc: roc_auc(&y_test, &scores),
    };

    Ok((forest, report))
}

/// Full pipeline: load the CSV, fit, evaluate, save the artifact.
pub fn train<P: AsRef<Path>, Q: AsRef<Path>>(
    data_path: P,
    model_path: Q,
    config: &TrainingConfig,
) -> Result<TrainingReport> {
    let records = load_dataset(data_path)?;
    let (forest, report) = fit(&records, config)?;

    info!("Held-out results:\n{}", report.report);
    match report.roc_auc {
        Some(auc) => info!(roc_auc = format!("{:.4}", auc), "ROC-AUC"),
        None => info!("ROC-AUC undefined: test split holds a single class"),
    }

    ModelLoader::new()
        .save(&ModelArtifact::new(forest), model_path.as_ref())
        .with_context(|| format!("Failed to save model to {}", model_path.as_ref().display()))?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::data_gen::{generate_credit_data, write_csv};

    fn fast_config() -> TrainingConfig {
        TrainingConfig {
            n_estimators: 10,
            max_depth: 6,
            ..AppConfig::default().training
        }
    }

    #[test]
    fn test_split_sizes() {
        let (train, test) = train_test_split(101, 0.2, 42);
        assert_eq!(test.len(), 21);
        assert_eq!(train.len(), 80);

        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..101).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_seeded() {
        assert_eq!(train_test_split(50, 0.2, 42), train_test_split(50, 0.2, 42));
    }

    #[test]
    fn test_missing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(dir.path().join("none.csv")).unwrap_err();
        assert!(err.to_string().contains("Dataset not found"));
    }

    #[test]
    fn test_train_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("data").join("credit.csv");
        let model_path = dir.path().join("models").join("credit_model.bin");

        write_csv(&generate_credit_data(1000, 42).unwrap(), &data_path).unwrap();
        let report = train(&data_path, &model_path, &fast_config()).unwrap();

        assert_eq!(report.rows, 1000);
        assert_eq!(report.test_rows, 200);
        assert_eq!(report.train_rows, 800);
        assert!(report.report.accuracy > 0.5);
        assert!(report.roc_auc.unwrap() > 0.6);

        let artifact = ModelLoader::new().load(&model_path).unwrap();
        assert!(artifact.validate().is_ok());
        assert_eq!(artifact.forest.n_trees(), 10);
    }
}
