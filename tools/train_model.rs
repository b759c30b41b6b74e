//! Model Training
//!
//! Fits the random forest on the generated dataset, prints held-out metrics
//! and saves the artifact the API loads.

use anyhow::Result;
use credit_scoring::{config::AppConfig, logging, training};
use tracing::info;

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.logging, "train_model")?;

    info!(
        dataset = %config.data.dataset_path,
        model = %config.model.path,
        "Starting training"
    );

    let report = training::train(&config.data.dataset_path, &config.model.path, &config.training)?;

    println!("{}", report.report);
    match report.roc_auc {
        Some(auc) => println!("ROC-AUC: {:.4}", auc),
        None => println!("ROC-AUC: undefined (single class in test split)"),
    }

    info!(path = %config.model.path, "Model saved");
    Ok(())
}
