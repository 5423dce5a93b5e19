use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Number of processing attempts a scan gets before it is parked as failed.
pub const DEFAULT_MAX_RETRIES: i32 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Display for ScanStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ScanStatus::Pending => write!(f, "pending"),
            ScanStatus::Processing => write!(f, "processing"),
            ScanStatus::Completed => write!(f, "completed"),
            ScanStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ScanStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScanStatus::Pending),
            "processing" => Ok(ScanStatus::Processing),
            "completed" => Ok(ScanStatus::Completed),
            "failed" => Ok(ScanStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid scan status: {}", s)),
        }
    }
}

impl ScanStatus {
    /// Terminal statuses never transition again without operator intervention.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }
}

/// One uploaded imaging study queued for automated analysis.
///
/// Created by the intake path with `status = pending`, `retry_count = 0`;
/// mutated exclusively by the orchestrator afterwards, never deleted by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: Uuid,
    pub patient_id: String,
    /// Doctor who uploaded the scan; carried into the derived clinical record.
    pub uploaded_by: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub original_filename: String,
    /// Blob-store URL. The orchestrator downloads it but does not own it.
    pub storage_path: String,
    pub file_size_bytes: Option<i64>,
    pub mime_type: Option<String>,
    pub status: ScanStatus,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub analysis: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for ScanRecord {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(ScanRecord {
            id: row.get("id"),
            patient_id: row.get("patient_id"),
            uploaded_by: row.get("uploaded_by"),
            session_id: row.get("session_id"),
            original_filename: row.get("original_filename"),
            storage_path: row.get("storage_path"),
            file_size_bytes: row.get("file_size_bytes"),
            mime_type: row.get("mime_type"),
            status: row.get::<String, _>("status").parse().map_err(|e| {
                sqlx::Error::Decode(format!("Failed to parse scan status: {}", e).into())
            })?,
            retry_count: row.get("retry_count"),
            error_message: row.get("error_message"),
            analysis: row.get("analysis"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            processed_at: row.get("processed_at"),
        })
    }
}

impl ScanRecord {
    /// Whether a further processing attempt is allowed after a failure.
    pub fn can_retry(&self, max_retries: i32) -> bool {
        self.retry_count < max_retries
    }
}

/// Per-scan outcome of one batch run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanOutcomeStatus {
    Success,
    Failed,
    /// Another worker claimed the scan first; nothing was done here.
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub id: Uuid,
    pub status: ScanOutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated result of one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Scans this run actually claimed and drove through the pipeline.
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
    /// One entry per fetched scan, including the skipped ones.
    pub results: Vec<ScanOutcome>,
}

impl BatchOutcome {
    pub fn record(&mut self, id: Uuid, status: ScanOutcomeStatus, error: Option<String>) {
        match status {
            ScanOutcomeStatus::Success => {
                self.processed += 1;
                self.success += 1;
            }
            ScanOutcomeStatus::Failed => {
                self.processed += 1;
                self.failed += 1;
            }
            ScanOutcomeStatus::Skipped => {}
        }
        self.results.push(ScanOutcome { id, status, error });
    }
}
