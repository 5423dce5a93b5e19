//! Postgres-backed store for the scan pipeline.
//!
//! `PgStore` owns a connection pool and exposes the repository methods the
//! orchestrator needs: eligible-scan selection, the conditional claim update,
//! transactional completion (scan + derived record), failure bookkeeping, and
//! patient lookups. The `ScanStore` trait impl lives here so callers hold an
//! explicitly constructed handle rather than module-level global state.

mod patients;
mod scans;
mod store_impl;

use neuroscan_core::PipelineError;
use sqlx::PgPool;

/// Durable store handle. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply embedded migrations. Called once at startup.
    pub async fn migrate(&self) -> Result<(), anyhow::Error> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run database migrations: {}", e))
    }

    /// Cheap connectivity probe for the health endpoint.
    pub async fn health_check(&self) -> Result<(), PipelineError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PipelineError::Transient(format!("Database unreachable: {}", e)))?;
        Ok(())
    }
}
