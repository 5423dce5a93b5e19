//! Store contract for the scan pipeline.
//!
//! The batch runner is written against this trait rather than a concrete
//! database handle so the store can be swapped (Postgres in production,
//! in-memory in tests) and so the handle's lifecycle is owned by whoever
//! constructs the runner, not by module-level global state.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::models::{NewClinicalRecord, PatientProfile, ScanAnalysis, ScanRecord, ScanStatus};

/// Durable record of scans, patients, and derived clinical records.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Scans eligible for processing: `status = pending` and
    /// `retry_count < max_retries`, oldest first, at most `limit` rows.
    /// Read-only. Errors here abort the whole batch run.
    async fn fetch_eligible(
        &self,
        limit: i64,
        max_retries: i32,
    ) -> Result<Vec<ScanRecord>, PipelineError>;

    /// Conditional status update guarded by the expected prior status.
    ///
    /// Returns `false` (without error) when the guard does not match, which
    /// is how a worker loses the claim race for a scan. Exactly one of N
    /// concurrent `transition(id, Pending, Processing)` calls can win.
    async fn transition(
        &self,
        scan_id: Uuid,
        expected: ScanStatus,
        new: ScanStatus,
    ) -> Result<bool, PipelineError>;

    /// Persist a completed analysis: analysis payload + `processed_at` +
    /// `status = completed` on the scan, and exactly one derived clinical
    /// record — as one unit. A failure must leave neither half behind.
    async fn complete(
        &self,
        scan_id: Uuid,
        analysis: &ScanAnalysis,
        record: &NewClinicalRecord,
    ) -> Result<(), PipelineError>;

    /// Record a failed attempt: new status, bumped retry count, and the
    /// failure message for diagnosis.
    async fn apply_failure(
        &self,
        scan_id: Uuid,
        status: ScanStatus,
        retry_count: i32,
        error_message: &str,
    ) -> Result<(), PipelineError>;

    /// Look up the patient data the analysis model needs. `Ok(None)` when no
    /// patient row exists; callers apply the profile defaults.
    async fn patient_profile(
        &self,
        patient_id: &str,
    ) -> Result<Option<PatientProfile>, PipelineError>;
}
