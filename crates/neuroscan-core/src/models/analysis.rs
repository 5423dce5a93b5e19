use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Model identifier stamped into every persisted analysis and derived record.
pub const ANALYSIS_MODEL_NAME: &str = "AssemblyNet-1.0.0";

/// Volume measurement for one segmented brain structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionVolume {
    pub volume_mm3: f64,
    /// Extra per-region fields the model reports (asymmetry index, normative
    /// percentile, ...) are kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RegionVolume {
    pub fn new(volume_mm3: f64) -> Self {
        Self {
            volume_mm3,
            extra: serde_json::Map::new(),
        }
    }
}

/// Volumetric segmentation output. The two structures we apply threshold
/// rules to are typed; everything else passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumetricData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hippocampus: Option<RegionVolume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ventricles: Option<RegionVolume>,
    #[serde(flatten)]
    pub other_regions: serde_json::Map<String, serde_json::Value>,
}

/// Payload of a completed analysis job as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub volumetric_data: VolumetricData,
    #[serde(default)]
    pub findings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_report_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_report_url: Option<String>,
}

/// The analysis object persisted onto a completed scan.
///
/// `findings` holds the model-reported findings followed by the structural
/// flags computed from the volumetric thresholds, so a reader of the scan row
/// sees both without consulting the derived record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanAnalysis {
    pub job_id: String,
    pub model: String,
    pub patient_age: i32,
    pub patient_sex: String,
    pub volumetric_data: VolumetricData,
    pub findings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_report_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_report_url: Option<String>,
    pub processed_at: DateTime<Utc>,
}
