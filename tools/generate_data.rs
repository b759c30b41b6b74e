//! Synthetic Dataset Generator
//!
//! Writes a labeled credit dataset to CSV.
//!
//! Usage: generate_data [output_path]

use anyhow::Result;
use credit_scoring::{config::AppConfig, data_gen, logging};
use tracing::info;

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.logging, "generate_data")?;

    let args: Vec<String> = std::env::args().collect();
    let output = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| config.data.dataset_path.clone());

    info!(
        samples = config.data.n_samples,
        seed = config.data.seed,
        output = %output,
        "Generating synthetic credit data"
    );

    let records = data_gen::generate_credit_data(config.data.n_samples, config.data.seed)?;
    data_gen::write_csv(&records, &output)?;

    Ok(())
}
