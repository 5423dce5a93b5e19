//! The batch driver: one invocation, one bounded pass over the queue.

use std::sync::Arc;

use neuroscan_analysis::{AnalysisGateway, JobPoller, PollerConfig, ScanSource, SubmitScan};
use neuroscan_analysis::poller::TransientPollPolicy;
use neuroscan_core::models::{
    BatchOutcome, PatientProfile, ScanOutcomeStatus, ScanRecord, ScanStatus,
};
use neuroscan_core::{Config, PipelineError, ScanStore};

use crate::materializer::materialize_result;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Upper bound on scans claimed per run; keeps one invocation inside the
    /// trigger's own execution budget.
    pub batch_limit: i64,
    pub poller: PollerConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_limit: 5,
            poller: PollerConfig::default(),
        }
    }
}

impl From<&Config> for BatchConfig {
    fn from(config: &Config) -> Self {
        Self {
            batch_limit: config.batch_limit,
            poller: PollerConfig {
                interval: config.poll_interval,
                max_attempts: config.max_poll_attempts,
                transient_policy: match config.transient_poll_budget {
                    Some(budget) => TransientPollPolicy::SeparateBudget(budget),
                    None => TransientPollPolicy::ConsumeAttempt,
                },
            },
        }
    }
}

/// Drives queued scans through the analysis pipeline.
///
/// Collaborator handles are injected; the processor owns no global state and
/// any number of processors (in this process or others) may share a store,
/// because ownership of a scan is decided by the conditional claim update
/// alone.
pub struct BatchProcessor {
    store: Arc<dyn ScanStore>,
    gateway: Arc<dyn AnalysisGateway>,
    source: Arc<dyn ScanSource>,
    retry_policy: RetryPolicy,
    config: BatchConfig,
}

impl BatchProcessor {
    pub fn new(
        store: Arc<dyn ScanStore>,
        gateway: Arc<dyn AnalysisGateway>,
        source: Arc<dyn ScanSource>,
        retry_policy: RetryPolicy,
        config: BatchConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            source,
            retry_policy,
            config,
        }
    }

    /// One trigger invocation: fetch, claim, process, aggregate.
    ///
    /// Only a failure to read the queue escapes as an error. Everything that
    /// goes wrong for an individual scan is absorbed into that scan's
    /// outcome entry, so one bad scan never shadows its siblings.
    #[tracing::instrument(skip(self))]
    pub async fn run_batch(&self) -> Result<BatchOutcome, PipelineError> {
        let scans = self
            .store
            .fetch_eligible(self.config.batch_limit, self.retry_policy.max_retries())
            .await?;

        if scans.is_empty() {
            tracing::info!("No pending scans to process");
            return Ok(BatchOutcome::default());
        }

        tracing::info!(count = scans.len(), "Found pending scans");
        let mut outcome = BatchOutcome::default();

        for scan in scans {
            let claimed = match self
                .store
                .transition(scan.id, ScanStatus::Pending, ScanStatus::Processing)
                .await
            {
                Ok(claimed) => claimed,
                Err(e) => {
                    // Could not even reach the store for this scan; its retry
                    // state is untouched and it stays eligible.
                    tracing::error!(scan_id = %scan.id, error = %e, "Claim attempt failed");
                    outcome.record(scan.id, ScanOutcomeStatus::Failed, Some(e.message()));
                    continue;
                }
            };

            if !claimed {
                tracing::debug!(scan_id = %scan.id, "Scan already claimed elsewhere, skipping");
                outcome.record(scan.id, ScanOutcomeStatus::Skipped, None);
                continue;
            }

            match self.process_scan(&scan).await {
                Ok(()) => {
                    outcome.record(scan.id, ScanOutcomeStatus::Success, None);
                }
                Err(e) => {
                    let message = e.message();
                    tracing::error!(
                        scan_id = %scan.id,
                        retry_count = scan.retry_count,
                        error = %message,
                        "Failed to process scan"
                    );

                    let disposition = self.retry_policy.dispose(scan.retry_count);
                    if disposition.is_terminal() {
                        tracing::warn!(
                            scan_id = %scan.id,
                            retry_count = disposition.retry_count,
                            "Scan exhausted its retries"
                        );
                    }
                    if let Err(store_err) = self
                        .store
                        .apply_failure(
                            scan.id,
                            disposition.status,
                            disposition.retry_count,
                            &message,
                        )
                        .await
                    {
                        tracing::error!(
                            scan_id = %scan.id,
                            error = %store_err,
                            "Failed to record scan failure"
                        );
                    }

                    outcome.record(scan.id, ScanOutcomeStatus::Failed, Some(message));
                }
            }
        }

        tracing::info!(
            processed = outcome.processed,
            success = outcome.success,
            failed = outcome.failed,
            "Batch finished"
        );
        Ok(outcome)
    }

    /// Full pipeline for one claimed scan.
    async fn process_scan(&self, scan: &ScanRecord) -> Result<(), PipelineError> {
        tracing::info!(
            scan_id = %scan.id,
            file_name = %scan.original_filename,
            "Processing scan"
        );

        let bytes = self.source.fetch(&scan.storage_path).await?;
        let profile = self.resolve_patient(&scan.patient_id).await;
        tracing::debug!(
            scan_id = %scan.id,
            size = bytes.len(),
            age = profile.age,
            sex = %profile.sex,
            "Scan downloaded, submitting for analysis"
        );

        let submit = SubmitScan {
            bytes,
            file_name: scan.original_filename.clone(),
            mime_type: scan.mime_type.clone(),
            age: profile.age,
            sex: profile.sex.clone(),
        };
        let job_id = self.gateway.submit(&submit).await?;

        let poller = JobPoller::new(self.config.poller.clone());
        let report = poller.wait_for_result(self.gateway.as_ref(), &job_id).await?;

        materialize_result(self.store.as_ref(), scan, &profile, &job_id, &report).await
    }

    /// Patient lookup is best-effort: a missing or unreachable record falls
    /// back to the model's defaults rather than failing the scan.
    async fn resolve_patient(&self, patient_id: &str) -> PatientProfile {
        match self.store.patient_profile(patient_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!(patient_id = %patient_id, "No patient record, using defaults");
                PatientProfile::default()
            }
            Err(e) => {
                tracing::warn!(
                    patient_id = %patient_id,
                    error = %e,
                    "Patient lookup failed, using defaults"
                );
                PatientProfile::default()
            }
        }
    }
}
