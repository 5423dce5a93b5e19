mod error;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use neuroscan_analysis::{HttpAnalysisGateway, HttpScanSource};
use neuroscan_core::Config;
use neuroscan_db::PgStore;
use neuroscan_worker::{BatchConfig, BatchProcessor, RetryPolicy};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let store = PgStore::new(pool);
    store.migrate().await?;

    let processor = BatchProcessor::new(
        Arc::new(store.clone()),
        Arc::new(HttpAnalysisGateway::new(config.analysis_model_url.clone())),
        Arc::new(HttpScanSource::new()),
        RetryPolicy::new(config.max_scan_retries),
        BatchConfig::from(&config),
    );

    let state = AppState {
        processor: Arc::new(processor),
        store,
        cron_secret: config.cron_secret.clone(),
    };

    let app = Router::new()
        .route("/api/cron/process-scans", get(handlers::process_scans))
        .route("/api/health/database", get(handlers::database_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Neuroscan API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
