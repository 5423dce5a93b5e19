use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VolumetricData;

/// Record type tag used for analysis summaries in `doctor_records`.
pub const MRI_SUMMARY_RECORD_TYPE: &str = "mri_summary";

/// A derived clinical record ready to be inserted alongside the scan's
/// completion. Consumed downstream by the chat/records features, which are
/// outside this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClinicalRecord {
    pub patient_id: String,
    pub doctor_id: Option<Uuid>,
    pub scan_id: Uuid,
    pub session_id: Option<Uuid>,
    pub record_type: String,
    /// One-line rollup, e.g. "MRI analysis completed: 2 findings, 1 structural observations".
    pub summary: String,
    /// The human-readable summary text with numbered findings and observations.
    pub detailed_notes: String,
    /// Full formatted record block including patient header and report link.
    pub content: String,
    pub metadata: RecordMetadata,
}

/// Structured metadata stored on the derived record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub model: String,
    pub job_id: String,
    pub volumetric_data: VolumetricData,
    pub patient_age: i32,
    pub patient_sex: String,
}

/// A persisted clinical record, as read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalRecord {
    pub id: Uuid,
    pub patient_id: String,
    pub doctor_id: Option<Uuid>,
    pub scan_id: Uuid,
    pub session_id: Option<Uuid>,
    pub record_type: String,
    pub summary: String,
    pub detailed_notes: String,
    pub content: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for ClinicalRecord {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(ClinicalRecord {
            id: row.get("id"),
            patient_id: row.get("patient_id"),
            doctor_id: row.get("doctor_id"),
            scan_id: row.get("mri_scan_id"),
            session_id: row.get("session_id"),
            record_type: row.get("record_type"),
            summary: row.get("summary"),
            detailed_notes: row.get("detailed_notes"),
            content: row.get("content"),
            metadata: row.get("metadata"),
            created_at: row.get("created_at"),
        })
    }
}
