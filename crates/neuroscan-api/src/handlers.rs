//! Request handlers for the trigger and health endpoints.

use std::time::Instant;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Serialize;

use neuroscan_core::models::ScanOutcome;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
    pub duration_ms: u128,
    pub results: Vec<ScanOutcome>,
}

/// `GET /api/cron/process-scans` — run one batch.
///
/// Invoked by an external scheduler or manually. When a cron secret is
/// configured, the request must carry it as a bearer token; an unset secret
/// leaves the endpoint open (deployments front it with their own scheduler
/// auth in that case).
pub async fn process_scans(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TriggerResponse>, ApiError> {
    if let Some(secret) = &state.cron_secret {
        if !bearer_matches(&headers, secret) {
            tracing::error!("Unauthorized cron request");
            return Err(ApiError::Unauthorized);
        }
    }

    let started = Instant::now();
    let outcome = state.processor.run_batch().await.map_err(|e| {
        tracing::error!(error = %e, "Batch run failed");
        ApiError::internal("Database error", e.to_string())
    })?;

    tracing::info!(
        processed = outcome.processed,
        success = outcome.success,
        failed = outcome.failed,
        duration_ms = started.elapsed().as_millis() as u64,
        "Batch run finished"
    );

    Ok(Json(TriggerResponse {
        processed: outcome.processed,
        success: outcome.success,
        failed: outcome.failed,
        duration_ms: started.elapsed().as_millis(),
        results: outcome.results,
    }))
}

fn bearer_matches(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == format!("Bearer {}", secret))
        .unwrap_or(false)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub latency_ms: u128,
}

/// `GET /api/health/database` — connectivity probe for dashboards and
/// startup checks.
pub async fn database_health(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    let started = Instant::now();
    state
        .store
        .health_check()
        .await
        .map_err(|e| ApiError::unavailable("Database unreachable", e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "ok",
        latency_ms: started.elapsed().as_millis(),
    }))
}
