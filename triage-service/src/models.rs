use serde::{Deserialize, Serialize};
use triage_core::{FileBlob, StructuredVerdict};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePredictionRequest {
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub additional_info: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SymptomSearchQuery {
    pub q: Option<String>,
}

/// Verdict fields at the top level, plus the id of the stored report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAnalysisResponse {
    #[serde(flatten)]
    pub verdict: StructuredVerdict,
    pub report_id: Uuid,
    pub saved_to_history: bool,
}

/// Parts collected from a report upload form.
#[derive(Debug, Default)]
pub struct ReportUpload {
    pub report_type: Option<String>,
    pub additional_notes: String,
    pub files: Vec<FileBlob>,
}
