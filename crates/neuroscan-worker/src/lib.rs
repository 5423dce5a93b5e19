//! Batch orchestration for the scan-analysis pipeline.
//!
//! One `BatchProcessor::run_batch` call is one trigger invocation: select
//! eligible scans, claim each with a conditional update, drive the claimed
//! ones through download → submit → poll → materialize, and route every
//! failure through the retry policy. Scans are isolated from each other; a
//! batch only fails as a whole when the queue itself cannot be read.

pub mod materializer;
pub mod orchestrator;
pub mod retry;

pub use orchestrator::{BatchConfig, BatchProcessor};
pub use retry::{FailureDisposition, RetryPolicy};
