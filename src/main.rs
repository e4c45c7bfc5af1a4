//! Fraud Scoring Service - Main Entry Point
//!
//! Loads the model artifacts once, then serves transaction scoring over HTTP.

use anyhow::{Context, Result};
use fraud_scoring_service::{
    api::{self, ApiKeyAuth, AppState},
    config::AppConfig,
    logging,
    metrics::{MetricsReporter, ServiceMetrics},
    models::ModelLoader,
    service::FraudScoringService,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;
    logging::init(&config.logging)?;

    info!(
        environment = ?config.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting Fraud Scoring Service"
    );

    // Missing artifacts are fatal only in production
    let state = ModelLoader::new(config.model.clone())
        .load(config.environment.is_production())
        .context("Failed to load model artifacts")?;
    if !state.is_loaded() {
        warn!("Serving in degraded mode: scores come from the fallback heuristic");
    }

    let service = FraudScoringService::new(Arc::new(state));
    let metrics = Arc::new(ServiceMetrics::new());
    let auth = ApiKeyAuth::from_config(&config.security, config.environment)?;

    // Start metrics reporter
    let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
    tokio::spawn(reporter.start());

    let app = api::router(
        AppState::new(service, metrics.clone(), auth),
        &config.security.cors_origins,
    );

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Service shutting down...");
    metrics.log_summary();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
