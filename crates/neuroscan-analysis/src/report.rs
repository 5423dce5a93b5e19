//! Report assembly: threshold rules and the text artifacts persisted with a
//! completed analysis.
//!
//! Everything here is pure; the store writes happen in the worker.

use chrono::Utc;

use neuroscan_core::models::{
    AnalysisReport, NewClinicalRecord, PatientProfile, RecordMetadata, ScanAnalysis, ScanRecord,
    VolumetricData, ANALYSIS_MODEL_NAME, MRI_SUMMARY_RECORD_TYPE,
};

/// Hippocampal volume below this (and above zero) flags possible atrophy.
pub const HIPPOCAMPUS_ATROPHY_THRESHOLD_MM3: f64 = 7000.0;
/// Ventricle volume above this flags enlargement.
pub const VENTRICLE_ENLARGEMENT_THRESHOLD_MM3: f64 = 60000.0;

pub const ATROPHY_FLAG: &str = "Possible hippocampal atrophy detected";
pub const VENTRICULAR_ENLARGEMENT_FLAG: &str = "Ventricular enlargement noted";

const SUMMARY_BASE: &str = "MRI volumetric analysis completed using AssemblyNet.";

/// Apply the fixed threshold rules to the volumetric output.
pub fn structural_flags(volumetric: &VolumetricData) -> Vec<String> {
    let mut flags = Vec::new();

    if let Some(hippocampus) = &volumetric.hippocampus {
        // Zero means the structure was not segmented, not that it vanished.
        if hippocampus.volume_mm3 > 0.0
            && hippocampus.volume_mm3 < HIPPOCAMPUS_ATROPHY_THRESHOLD_MM3
        {
            flags.push(ATROPHY_FLAG.to_string());
        }
    }

    if let Some(ventricles) = &volumetric.ventricles {
        if ventricles.volume_mm3 > VENTRICLE_ENLARGEMENT_THRESHOLD_MM3 {
            flags.push(VENTRICULAR_ENLARGEMENT_FLAG.to_string());
        }
    }

    flags
}

fn numbered(lines: &[String]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human-readable summary: base line, then numbered model findings, then
/// numbered structural observations.
pub fn summary_text(findings: &[String], flags: &[String]) -> String {
    let mut text = SUMMARY_BASE.to_string();

    if !findings.is_empty() {
        text.push_str("\n\nKey Findings:\n");
        text.push_str(&numbered(findings));
    }

    if !flags.is_empty() {
        text.push_str("\n\nStructural Observations:\n");
        text.push_str(&numbered(flags));
    }

    text
}

/// One-line rollup stored as the derived record's summary.
pub fn summary_line(findings: &[String], flags: &[String]) -> String {
    format!(
        "MRI analysis completed: {} findings, {} structural observations",
        findings.len(),
        flags.len()
    )
}

/// Full formatted record block: patient header, the summary text, and the
/// report link when the service produced one.
pub fn record_content(
    scan: &ScanRecord,
    profile: &PatientProfile,
    summary: &str,
    pdf_report_url: Option<&str>,
) -> String {
    let mut content = format!(
        "MRI Volumetric Analysis (AssemblyNet)\n\
         Patient: {}\n\
         Age: {} years | Sex: {}\n\
         Scan Date: {}\n\
         File: {}\n\n\
         {}",
        profile.name.as_deref().unwrap_or("Unknown"),
        profile.age,
        profile.sex,
        scan.created_at.format("%Y-%m-%d"),
        scan.original_filename,
        summary,
    );

    if let Some(url) = pdf_report_url {
        content.push_str(&format!("\n\nFull Report: {}", url));
    }

    content
}

/// Build both persisted artifacts for a completed job: the analysis object
/// stored on the scan and the derived clinical record.
pub fn build_artifacts(
    scan: &ScanRecord,
    profile: &PatientProfile,
    job_id: &str,
    report: &AnalysisReport,
) -> (ScanAnalysis, NewClinicalRecord) {
    let flags = structural_flags(&report.volumetric_data);
    let summary = summary_text(&report.findings, &flags);

    // The stored findings carry the model's findings and the computed flags,
    // so the scan row alone tells the whole story.
    let mut combined_findings = report.findings.clone();
    combined_findings.extend(flags.iter().cloned());

    let analysis = ScanAnalysis {
        job_id: job_id.to_string(),
        model: ANALYSIS_MODEL_NAME.to_string(),
        patient_age: profile.age,
        patient_sex: profile.sex.clone(),
        volumetric_data: report.volumetric_data.clone(),
        findings: combined_findings,
        pdf_report_url: report.pdf_report_url.clone(),
        csv_report_url: report.csv_report_url.clone(),
        processed_at: Utc::now(),
    };

    let record = NewClinicalRecord {
        patient_id: scan.patient_id.clone(),
        doctor_id: scan.uploaded_by,
        scan_id: scan.id,
        session_id: scan.session_id,
        record_type: MRI_SUMMARY_RECORD_TYPE.to_string(),
        summary: summary_line(&report.findings, &flags),
        detailed_notes: summary.clone(),
        content: record_content(scan, profile, &summary, report.pdf_report_url.as_deref()),
        metadata: RecordMetadata {
            model: ANALYSIS_MODEL_NAME.to_string(),
            job_id: job_id.to_string(),
            volumetric_data: report.volumetric_data.clone(),
            patient_age: profile.age,
            patient_sex: profile.sex.clone(),
        },
    };

    (analysis, record)
}
