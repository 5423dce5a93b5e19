//! Turns a completed job payload into durable records.

use neuroscan_analysis::report::build_artifacts;
use neuroscan_core::models::{AnalysisReport, PatientProfile, ScanRecord};
use neuroscan_core::{PipelineError, ScanStore};

/// Persist a completed analysis: the structured analysis object on the scan
/// (with `processed_at` and `status = completed`) and exactly one derived
/// clinical record.
///
/// Both writes happen inside the store's `complete` unit, so a failure in
/// either leaves the scan unfinished and flows back into the retry path —
/// never a scan marked completed without its record.
pub async fn materialize_result(
    store: &dyn ScanStore,
    scan: &ScanRecord,
    profile: &PatientProfile,
    job_id: &str,
    report: &AnalysisReport,
) -> Result<(), PipelineError> {
    let (analysis, record) = build_artifacts(scan, profile, job_id, report);

    store.complete(scan.id, &analysis, &record).await?;

    tracing::info!(
        scan_id = %scan.id,
        job_id = %job_id,
        findings = analysis.findings.len(),
        "Analysis results materialized"
    );
    Ok(())
}
