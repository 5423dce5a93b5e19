//! Wire-level client for the external analysis service.
//!
//! The service exposes two endpoints: a multipart `POST /upload` that queues
//! a job and returns its id, and `GET /status/{job_id}` for polling. Status
//! payloads are decoded exactly once, here, into the `JobState` sum type;
//! nothing downstream touches raw JSON.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart;
use serde::Deserialize;

use neuroscan_core::models::{AnalysisReport, VolumetricData};
use neuroscan_core::PipelineError;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Everything the upload endpoint needs for one scan.
#[derive(Debug, Clone)]
pub struct SubmitScan {
    pub bytes: Bytes,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub age: i32,
    pub sex: String,
}

/// Decoded job status.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Queued,
    Processing,
    Completed(AnalysisReport),
    Failed { reason: String },
}

/// Client to the long-running analysis service.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// Queue a scan for analysis. Returns the opaque job id.
    async fn submit(&self, scan: &SubmitScan) -> Result<String, PipelineError>;

    /// One status poll. Transport failures are `PipelineError::Transient`;
    /// they do not decide the job's fate, the poller's budget does.
    async fn poll(&self, job_id: &str) -> Result<JobState, PipelineError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: WireStatus,
    #[serde(default)]
    volumetric_data: Option<VolumetricData>,
    #[serde(default)]
    findings: Option<Vec<String>>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    pdf_report_url: Option<String>,
    #[serde(default)]
    csv_report_url: Option<String>,
}

impl From<StatusResponse> for JobState {
    fn from(response: StatusResponse) -> Self {
        match response.status {
            WireStatus::Queued => JobState::Queued,
            WireStatus::Processing => JobState::Processing,
            WireStatus::Completed => JobState::Completed(AnalysisReport {
                volumetric_data: response.volumetric_data.unwrap_or_default(),
                findings: response.findings.unwrap_or_default(),
                pdf_report_url: response.pdf_report_url,
                csv_report_url: response.csv_report_url,
            }),
            WireStatus::Failed => JobState::Failed {
                reason: response
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            },
        }
    }
}

/// reqwest-backed gateway.
#[derive(Clone)]
pub struct HttpAnalysisGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AnalysisGateway for HttpAnalysisGateway {
    #[tracing::instrument(skip(self, scan), fields(file_name = %scan.file_name))]
    async fn submit(&self, scan: &SubmitScan) -> Result<String, PipelineError> {
        let mime = scan.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE);
        let part = multipart::Part::bytes(scan.bytes.to_vec())
            .file_name(scan.file_name.clone())
            .mime_str(mime)
            .map_err(|e| {
                PipelineError::Upload(format!("Invalid mime type {:?}: {}", mime, e))
            })?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("age", scan.age.to_string())
            .text("sex", scan.sex.clone());

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| PipelineError::Upload(format!("Analysis upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Upload(format!(
                "Analysis upload failed: {} - {}",
                status, body
            )));
        }

        let upload: UploadResponse = response.json().await.map_err(|e| {
            PipelineError::Upload(format!("Analysis upload returned malformed response: {}", e))
        })?;

        tracing::info!(job_id = %upload.job_id, "Analysis job queued");
        Ok(upload.job_id)
    }

    #[tracing::instrument(skip(self))]
    async fn poll(&self, job_id: &str) -> Result<JobState, PipelineError> {
        let response = self
            .client
            .get(format!("{}/status/{}", self.base_url, job_id))
            .send()
            .await
            .map_err(|e| PipelineError::Transient(format!("Status check failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Transient(format!(
                "Status check failed: HTTP {}",
                status
            )));
        }

        let decoded: StatusResponse = response.json().await.map_err(|e| {
            PipelineError::Transient(format!("Status response malformed: {}", e))
        })?;

        Ok(decoded.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> JobState {
        serde_json::from_value::<StatusResponse>(value).unwrap().into()
    }

    #[test]
    fn test_decode_queued_and_processing() {
        assert_eq!(decode(json!({"status": "queued"})), JobState::Queued);
        assert_eq!(decode(json!({"status": "processing"})), JobState::Processing);
    }

    #[test]
    fn test_decode_completed_with_payload() {
        let state = decode(json!({
            "status": "completed",
            "volumetric_data": {"hippocampus": {"volume_mm3": 6000.0}},
            "findings": ["mild recall deficit"],
            "pdf_report_url": "https://reports.test/j1.pdf"
        }));

        match state {
            JobState::Completed(report) => {
                assert_eq!(
                    report.volumetric_data.hippocampus.unwrap().volume_mm3,
                    6000.0
                );
                assert_eq!(report.findings, vec!["mild recall deficit".to_string()]);
                assert_eq!(
                    report.pdf_report_url.as_deref(),
                    Some("https://reports.test/j1.pdf")
                );
            }
            other => panic!("expected completed, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_completed_without_optional_fields() {
        match decode(json!({"status": "completed"})) {
            JobState::Completed(report) => {
                assert!(report.findings.is_empty());
                assert!(report.volumetric_data.hippocampus.is_none());
            }
            other => panic!("expected completed, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_failed_with_and_without_reason() {
        assert_eq!(
            decode(json!({"status": "failed", "error": "corrupt volume"})),
            JobState::Failed {
                reason: "corrupt volume".to_string()
            }
        );
        assert_eq!(
            decode(json!({"status": "failed"})),
            JobState::Failed {
                reason: "Unknown error".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_status_is_a_decode_error() {
        let result = serde_json::from_value::<StatusResponse>(json!({"status": "exploded"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_upload_response_decodes() {
        let response: UploadResponse =
            serde_json::from_value(json!({"job_id": "J1"})).unwrap();
        assert_eq!(response.job_id, "J1");
    }
}
