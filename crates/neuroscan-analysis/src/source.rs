//! Scan file retrieval from blob storage.
//!
//! Scans are stored as plain HTTPS URLs (`storage_path`); the pipeline
//! downloads the bytes before submitting them to the analysis service. The
//! blob store itself is not ours, so failures here are transient and the
//! scan gets retried on a later run.

use async_trait::async_trait;
use bytes::Bytes;

use neuroscan_core::PipelineError;

#[async_trait]
pub trait ScanSource: Send + Sync {
    async fn fetch(&self, storage_path: &str) -> Result<Bytes, PipelineError>;
}

#[derive(Clone, Default)]
pub struct HttpScanSource {
    client: reqwest::Client,
}

impl HttpScanSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScanSource for HttpScanSource {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, storage_path: &str) -> Result<Bytes, PipelineError> {
        let response = self
            .client
            .get(storage_path)
            .send()
            .await
            .map_err(|e| PipelineError::Transient(format!("Failed to download file: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Transient(format!(
                "Failed to download file: HTTP {}",
                status
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            PipelineError::Transient(format!("Failed to read downloaded file: {}", e))
        })?;

        tracing::debug!(size = bytes.len(), "Downloaded scan file");
        Ok(bytes)
    }
}
