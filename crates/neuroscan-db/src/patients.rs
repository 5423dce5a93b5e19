//! Patient lookups for the analysis submission.

use chrono::NaiveDate;
use neuroscan_core::models::PatientProfile;
use neuroscan_core::PipelineError;
use sqlx::Row;

use crate::PgStore;

impl PgStore {
    /// Resolve the age/sex/name slice the analysis model needs.
    ///
    /// Returns `Ok(None)` when no patient row exists; missing columns inside
    /// an existing row fall back to the profile defaults.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_patient_profile(
        &self,
        patient_id: &str,
    ) -> Result<Option<PatientProfile>, PipelineError> {
        let row = sqlx::query(
            r#"
            SELECT dob, name, sex, gender
            FROM patients
            WHERE patient_id = $1
            "#,
        )
        .bind(patient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(patient_id = %patient_id, error = %e, "Failed to fetch patient");
            PipelineError::Transient(format!("Failed to fetch patient: {}", e))
        })?;

        Ok(row.map(|row| {
            PatientProfile::resolve(
                row.get::<Option<NaiveDate>, _>("dob"),
                row.get::<Option<String>, _>("sex"),
                row.get::<Option<String>, _>("gender"),
                row.get::<Option<String>, _>("name"),
            )
        }))
    }
}
