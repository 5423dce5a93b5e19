//! Analysis-service integration: the wire gateway, the blob source, the
//! polling state machine, and assembly of the persisted report artifacts.

pub mod gateway;
pub mod poller;
pub mod report;
pub mod source;

pub use gateway::{AnalysisGateway, HttpAnalysisGateway, JobState, SubmitScan};
pub use poller::{JobPoller, PollerConfig, TransientPollPolicy};
pub use source::{HttpScanSource, ScanSource};
