//! Loan Application UI
//!
//! Serves an HTML form and relays submissions to the scoring API named by
//! `API_URL`.

use anyhow::{Context, Result};
use credit_scoring::{
    config::AppConfig,
    logging,
    ui::{self, ScoringClient, UiState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.logging, "loan_ui")?;

    let client = ScoringClient::from_env(&config.ui.api_url);
    info!(api_url = %client.base_url(), "Scoring API configured");

    let state = UiState {
        client: Arc::new(client),
        threshold: config.decision.threshold,
    };

    let addr = config.ui_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("UI available at http://{}", addr);

    axum::serve(listener, ui::router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    Ok(())
}
