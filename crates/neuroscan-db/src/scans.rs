//! Scan queue queries: selection, claim, completion, failure bookkeeping.

use neuroscan_core::models::{NewClinicalRecord, ScanAnalysis, ScanRecord, ScanStatus};
use neuroscan_core::PipelineError;
use sqlx::Postgres;
use uuid::Uuid;

use crate::PgStore;

const SCAN_COLUMNS: &str = r#"
    id,
    patient_id,
    uploaded_by,
    session_id,
    original_filename,
    storage_path,
    file_size_bytes,
    mime_type,
    status,
    retry_count,
    error_message,
    analysis,
    created_at,
    updated_at,
    processed_at
"#;

impl PgStore {
    /// Pending scans with remaining retry budget, oldest first so no scan
    /// starves behind newer uploads.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_eligible_scans(
        &self,
        limit: i64,
        max_retries: i32,
    ) -> Result<Vec<ScanRecord>, PipelineError> {
        let sql = format!(
            r#"
            SELECT {SCAN_COLUMNS}
            FROM mri_scans
            WHERE status = 'pending'
                AND retry_count < $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        );
        let scans: Vec<ScanRecord> = sqlx::query_as::<Postgres, ScanRecord>(&sql)
            .bind(max_retries)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to fetch eligible scans");
                PipelineError::Transient(format!("Failed to fetch eligible scans: {}", e))
            })?;

        tracing::debug!(count = scans.len(), "Fetched eligible scans");
        Ok(scans)
    }

    /// Conditional status update: succeeds only if the scan is still in the
    /// expected status. One row affected means this worker won the claim.
    #[tracing::instrument(skip(self))]
    pub async fn transition_scan(
        &self,
        scan_id: Uuid,
        expected: ScanStatus,
        new: ScanStatus,
    ) -> Result<bool, PipelineError> {
        let result = sqlx::query(
            r#"
            UPDATE mri_scans
            SET status = $3,
                updated_at = NOW()
            WHERE id = $1
                AND status = $2
            "#,
        )
        .bind(scan_id)
        .bind(expected.to_string())
        .bind(new.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(scan_id = %scan_id, error = %e, "Failed to update scan status");
            PipelineError::Transient(format!("Failed to update scan status: {}", e))
        })?;

        let claimed = result.rows_affected() == 1;
        if claimed {
            tracing::debug!(scan_id = %scan_id, from = %expected, to = %new, "Scan status updated");
        } else {
            tracing::debug!(scan_id = %scan_id, expected = %expected, "Scan not in expected status, no-op");
        }
        Ok(claimed)
    }

    /// Persist a completed analysis and its derived clinical record in one
    /// transaction, so the scan is never marked completed without the record
    /// existing (or vice versa).
    #[tracing::instrument(skip(self, analysis, record))]
    pub async fn complete_scan_with_record(
        &self,
        scan_id: Uuid,
        analysis: &ScanAnalysis,
        record: &NewClinicalRecord,
    ) -> Result<(), PipelineError> {
        let analysis_json = serde_json::to_value(analysis).map_err(|e| {
            PipelineError::Persistence(format!("Failed to serialize analysis: {}", e))
        })?;
        let metadata_json = serde_json::to_value(&record.metadata).map_err(|e| {
            PipelineError::Persistence(format!("Failed to serialize record metadata: {}", e))
        })?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            PipelineError::Persistence(format!("Failed to begin completion transaction: {}", e))
        })?;

        let updated = sqlx::query(
            r#"
            UPDATE mri_scans
            SET status = 'completed',
                analysis = $2,
                error_message = NULL,
                processed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(scan_id)
        .bind(&analysis_json)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            PipelineError::Persistence(format!("Failed to store analysis on scan: {}", e))
        })?;

        if updated.rows_affected() != 1 {
            return Err(PipelineError::Persistence(format!(
                "Scan {} disappeared before completion could be stored",
                scan_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO doctor_records (
                patient_id, doctor_id, mri_scan_id, session_id,
                record_type, summary, detailed_notes, content, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&record.patient_id)
        .bind(record.doctor_id)
        .bind(record.scan_id)
        .bind(record.session_id)
        .bind(&record.record_type)
        .bind(&record.summary)
        .bind(&record.detailed_notes)
        .bind(&record.content)
        .bind(&metadata_json)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            PipelineError::Persistence(format!("Failed to insert clinical record: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            PipelineError::Persistence(format!("Failed to commit completion transaction: {}", e))
        })?;

        tracing::info!(
            scan_id = %scan_id,
            patient_id = %record.patient_id,
            "Scan completed, analysis and clinical record stored"
        );
        Ok(())
    }

    /// Record a failed processing attempt.
    #[tracing::instrument(skip(self, error_message))]
    pub async fn apply_scan_failure(
        &self,
        scan_id: Uuid,
        status: ScanStatus,
        retry_count: i32,
        error_message: &str,
    ) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            UPDATE mri_scans
            SET status = $2,
                retry_count = $3,
                error_message = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(scan_id)
        .bind(status.to_string())
        .bind(retry_count)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(scan_id = %scan_id, error = %e, "Failed to record scan failure");
            PipelineError::Persistence(format!("Failed to record scan failure: {}", e))
        })?;

        tracing::info!(
            scan_id = %scan_id,
            status = %status,
            retry_count = retry_count,
            "Scan failure recorded"
        );
        Ok(())
    }
}
