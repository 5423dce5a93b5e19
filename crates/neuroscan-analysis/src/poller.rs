//! Polling state machine for one analysis job.
//!
//! After a successful submit the job is polled on a fixed interval until it
//! reports a terminal state or the attempt budget runs out. The wait is an
//! ordinary awaited sleep: the host task stays schedulable and the whole
//! loop is cancelled by dropping the future.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use neuroscan_core::models::AnalysisReport;
use neuroscan_core::PipelineError;

use crate::gateway::{AnalysisGateway, JobState};

/// How a transport-level poll failure is charged.
///
/// The service being briefly unreachable is not the same signal as the job
/// still running, so the budget they share is a policy choice, not a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientPollPolicy {
    /// The failure spends one attempt from the shared ceiling (so a job can
    /// time out faster when the service is flapping).
    ConsumeAttempt,
    /// Transient failures draw from their own budget; exhausting it fails
    /// the attempt with the last transport error.
    SeparateBudget(u32),
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    pub transient_policy: TransientPollPolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 60,
            transient_policy: TransientPollPolicy::ConsumeAttempt,
        }
    }
}

pub struct JobPoller {
    config: PollerConfig,
}

impl JobPoller {
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    /// Drive `job_id` to a terminal outcome.
    ///
    /// Returns the completed payload, an `Analysis` error when the job
    /// itself fails, a `Timeout` when the attempt ceiling is reached, or a
    /// `Transient` error when a separate transient budget is exhausted.
    pub async fn wait_for_result(
        &self,
        gateway: &dyn AnalysisGateway,
        job_id: &str,
    ) -> Result<AnalysisReport, PipelineError> {
        let started = Instant::now();
        let mut attempts: u32 = 0;
        let mut transient_failures: u32 = 0;

        while attempts < self.config.max_attempts {
            sleep(self.config.interval).await;
            attempts += 1;

            match gateway.poll(job_id).await {
                Ok(JobState::Completed(report)) => {
                    tracing::info!(
                        job_id = %job_id,
                        attempts = attempts,
                        elapsed_secs = started.elapsed().as_secs(),
                        "Analysis completed"
                    );
                    return Ok(report);
                }
                Ok(JobState::Failed { reason }) => {
                    return Err(PipelineError::Analysis(format!(
                        "Analysis processing failed: {}",
                        reason
                    )));
                }
                Ok(JobState::Queued) | Ok(JobState::Processing) => {
                    tracing::trace!(
                        job_id = %job_id,
                        attempts = attempts,
                        max_attempts = self.config.max_attempts,
                        "Job still running"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        job_id = %job_id,
                        attempts = attempts,
                        error = %e,
                        "Status check failed, continuing to poll"
                    );
                    match self.config.transient_policy {
                        TransientPollPolicy::ConsumeAttempt => {}
                        TransientPollPolicy::SeparateBudget(budget) => {
                            attempts -= 1;
                            transient_failures += 1;
                            if transient_failures >= budget {
                                return Err(e);
                            }
                        }
                    }
                }
            }
        }

        Err(PipelineError::Timeout {
            attempts,
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use neuroscan_core::models::{RegionVolume, VolumetricData};
    use std::sync::Mutex;

    /// Gateway that replays a scripted sequence of poll results.
    struct ScriptedGateway {
        script: Mutex<Vec<Result<JobState, PipelineError>>>,
        polls: Mutex<u32>,
    }

    impl ScriptedGateway {
        fn new(script: Vec<Result<JobState, PipelineError>>) -> Self {
            let mut script = script;
            script.reverse();
            Self {
                script: Mutex::new(script),
                polls: Mutex::new(0),
            }
        }

        fn poll_count(&self) -> u32 {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl AnalysisGateway for ScriptedGateway {
        async fn submit(&self, _scan: &crate::gateway::SubmitScan) -> Result<String, PipelineError> {
            Ok("scripted".to_string())
        }

        async fn poll(&self, _job_id: &str) -> Result<JobState, PipelineError> {
            *self.polls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop()
                // Once the script runs dry, the job just stays running.
                .unwrap_or(Ok(JobState::Processing))
        }
    }

    fn completed_report() -> AnalysisReport {
        AnalysisReport {
            volumetric_data: VolumetricData {
                hippocampus: Some(RegionVolume::new(6000.0)),
                ventricles: None,
                other_regions: serde_json::Map::new(),
            },
            findings: vec!["mild recall deficit".to_string()],
            pdf_report_url: None,
            csv_report_url: None,
        }
    }

    fn poller() -> JobPoller {
        JobPoller::new(PollerConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_several_processing_cycles() {
        let gateway = ScriptedGateway::new(vec![
            Ok(JobState::Processing),
            Ok(JobState::Processing),
            Ok(JobState::Processing),
            Ok(JobState::Processing),
            Ok(JobState::Completed(completed_report())),
        ]);

        let report = poller().wait_for_result(&gateway, "J1").await.unwrap();
        assert_eq!(report.findings, vec!["mild recall deficit".to_string()]);
        assert_eq!(gateway.poll_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn queued_states_keep_the_loop_going() {
        let gateway = ScriptedGateway::new(vec![
            Ok(JobState::Queued),
            Ok(JobState::Queued),
            Ok(JobState::Completed(completed_report())),
        ]);

        assert!(poller().wait_for_result(&gateway, "J1").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn job_failure_surfaces_the_reason() {
        let gateway = ScriptedGateway::new(vec![
            Ok(JobState::Processing),
            Ok(JobState::Failed {
                reason: "corrupt volume".to_string(),
            }),
        ]);

        let err = poller().wait_for_result(&gateway, "J1").await.unwrap_err();
        match err {
            PipelineError::Analysis(msg) => {
                assert_eq!(msg, "Analysis processing failed: corrupt volume")
            }
            other => panic!("expected analysis failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_attempt_ceiling() {
        // Empty script: every poll reports the job still running.
        let gateway = ScriptedGateway::new(vec![]);

        let err = poller().wait_for_result(&gateway, "J1").await.unwrap_err();
        match err {
            PipelineError::Timeout { attempts, elapsed } => {
                assert_eq!(attempts, 60);
                assert_eq!(elapsed.as_secs(), 600);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(gateway.poll_count(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_consume_shared_budget_by_default() {
        let mut script: Vec<Result<JobState, PipelineError>> = Vec::new();
        for _ in 0..59 {
            script.push(Err(PipelineError::Transient("HTTP 502".to_string())));
        }
        // The would-be final answer arrives one poll too late.
        script.push(Ok(JobState::Processing));
        script.push(Ok(JobState::Completed(completed_report())));
        let gateway = ScriptedGateway::new(script);

        let err = poller().wait_for_result(&gateway, "J1").await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout { attempts: 60, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn separate_budget_spares_the_attempt_ceiling() {
        let mut script: Vec<Result<JobState, PipelineError>> = Vec::new();
        for _ in 0..59 {
            script.push(Err(PipelineError::Transient("HTTP 502".to_string())));
        }
        script.push(Ok(JobState::Processing));
        script.push(Ok(JobState::Completed(completed_report())));
        let gateway = ScriptedGateway::new(script);

        let poller = JobPoller::new(PollerConfig {
            transient_policy: TransientPollPolicy::SeparateBudget(100),
            ..PollerConfig::default()
        });
        assert!(poller.wait_for_result(&gateway, "J1").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn separate_budget_exhaustion_fails_with_transport_error() {
        let gateway = ScriptedGateway::new(vec![
            Err(PipelineError::Transient("HTTP 502".to_string())),
            Err(PipelineError::Transient("HTTP 502".to_string())),
            Err(PipelineError::Transient("HTTP 502".to_string())),
        ]);

        let poller = JobPoller::new(PollerConfig {
            transient_policy: TransientPollPolicy::SeparateBudget(3),
            ..PollerConfig::default()
        });
        let err = poller.wait_for_result(&gateway, "J1").await.unwrap_err();
        assert!(matches!(err, PipelineError::Transient(_)));
        assert_eq!(gateway.poll_count(), 3);
    }
}
