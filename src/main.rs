//! Credit Scoring API - Main Entry Point
//!
//! Loads the trained forest, then serves `/predict` over HTTP. A missing or
//! unreadable model leaves the server up but not ready.

use anyhow::{Context, Result};
use credit_scoring::{
    api::{self, AppState},
    config::AppConfig,
    logging,
    metrics::MetricsReporter,
    models::inference::ScoringService,
    types::prediction::DecisionPolicy,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.logging, "credit_scoring")?;

    info!("Starting Credit Scoring API");

    // Load the model; failure leaves the service unready
    let mut scoring = ScoringService::new();
    match scoring.load(&config.model.path) {
        Ok(()) => {
            if let Some(model) = scoring.model_info() {
                info!(
                    path = %config.model.path,
                    trees = model.trees,
                    max_depth = model.max_depth,
                    trained_at = %model.trained_at,
                    "Model loaded"
                );
            }
        }
        Err(e) => {
            error!(path = %config.model.path, error = %e, "Failed to load model");
            warn!("Serving without a model; /predict will fail until restart");
        }
    }

    let policy = DecisionPolicy::new(config.decision.threshold);
    info!("Decision threshold: {:.2}", policy.threshold());

    let state = AppState::new(scoring, policy);
    let metrics = state.metrics.clone();

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API shutting down...");
    metrics.log_summary();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
