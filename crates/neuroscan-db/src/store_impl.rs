use async_trait::async_trait;
use uuid::Uuid;

use neuroscan_core::models::{NewClinicalRecord, PatientProfile, ScanAnalysis, ScanRecord, ScanStatus};
use neuroscan_core::{PipelineError, ScanStore};

use crate::PgStore;

#[async_trait]
impl ScanStore for PgStore {
    async fn fetch_eligible(
        &self,
        limit: i64,
        max_retries: i32,
    ) -> Result<Vec<ScanRecord>, PipelineError> {
        self.fetch_eligible_scans(limit, max_retries).await
    }

    async fn transition(
        &self,
        scan_id: Uuid,
        expected: ScanStatus,
        new: ScanStatus,
    ) -> Result<bool, PipelineError> {
        self.transition_scan(scan_id, expected, new).await
    }

    async fn complete(
        &self,
        scan_id: Uuid,
        analysis: &ScanAnalysis,
        record: &NewClinicalRecord,
    ) -> Result<(), PipelineError> {
        self.complete_scan_with_record(scan_id, analysis, record).await
    }

    async fn apply_failure(
        &self,
        scan_id: Uuid,
        status: ScanStatus,
        retry_count: i32,
        error_message: &str,
    ) -> Result<(), PipelineError> {
        self.apply_scan_failure(scan_id, status, retry_count, error_message)
            .await
    }

    async fn patient_profile(
        &self,
        patient_id: &str,
    ) -> Result<Option<PatientProfile>, PipelineError> {
        self.fetch_patient_profile(patient_id).await
    }
}
