//! Error types module
//!
//! Every failure the scan pipeline can hit falls into one of five categories,
//! and the category decides how the batch runner reacts: transient store/network
//! trouble and persistence failures are retried at the scan level, an explicit
//! analysis failure or poll timeout is retried the same way, and only a failure
//! while reading the queue aborts a whole batch run.
//!
//! `Display` deliberately renders just the message that was attached at the
//! failure site (which already carries transport status codes, reasons, etc.),
//! because that exact text is what gets recorded on the scan as `error_message`.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Store or network unreachable. Retryable at the scan level; aborts the
    /// batch when it happens during eligible-scan selection.
    #[error("{0}")]
    Transient(String),

    /// The analysis service rejected the submit call or the transport failed.
    #[error("{0}")]
    Upload(String),

    /// The external job reported terminal failure with a reason.
    #[error("{0}")]
    Analysis(String),

    /// The poll attempt budget ran out without a terminal job state.
    #[error("analysis timed out after {} seconds ({attempts} polls)", .elapsed.as_secs())]
    Timeout { attempts: u32, elapsed: Duration },

    /// Writing the analysis results or the derived clinical record failed.
    #[error("{0}")]
    Persistence(String),
}

impl PipelineError {
    /// True for failures that occur before any job was accepted by the
    /// analysis service (useful in logs to separate our side from theirs).
    pub fn is_pre_submit(&self) -> bool {
        matches!(self, PipelineError::Transient(_) | PipelineError::Upload(_))
    }

    /// The text recorded on the scan as `error_message`.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_bare_message() {
        let err = PipelineError::Upload("network timeout".to_string());
        assert_eq!(err.to_string(), "network timeout");

        let err = PipelineError::Analysis("model crashed on slice 42".to_string());
        assert_eq!(err.to_string(), "model crashed on slice 42");
    }

    #[test]
    fn timeout_message_reports_wall_clock_and_attempts() {
        let err = PipelineError::Timeout {
            attempts: 60,
            elapsed: Duration::from_secs(600),
        };
        let msg = err.to_string();
        assert!(msg.contains("600 seconds"), "got: {}", msg);
        assert!(msg.contains("60 polls"), "got: {}", msg);
    }

    #[test]
    fn pre_submit_classification() {
        assert!(PipelineError::Transient("download failed".into()).is_pre_submit());
        assert!(PipelineError::Upload("rejected".into()).is_pre_submit());
        assert!(!PipelineError::Analysis("bad scan".into()).is_pre_submit());
        assert!(!PipelineError::Persistence("insert failed".into()).is_pre_submit());
    }
}
