use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TriageError};
use crate::humanize::title_case;

/// Coarse triage level attached to every verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    /// Accepts exactly `low`, `medium` or `high` after trimming, ignoring case.
    pub fn parse_strict(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Urgency::Low),
            "medium" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Abnormal,
}

impl Severity {
    /// Anything other than an explicit "normal" is treated as abnormal.
    pub fn from_label(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("normal") {
            Severity::Normal
        } else {
            Severity::Abnormal
        }
    }
}

/// Trimmed, deduplicated, non-empty collection of symptom strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SymptomSet(Vec<String>);

impl SymptomSet {
    pub fn new<I, S>(symptoms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cleaned: Vec<String> = Vec::new();
        for symptom in symptoms {
            let symptom = symptom.as_ref().trim();
            if symptom.is_empty() || cleaned.iter().any(|s| s == symptom) {
                continue;
            }
            cleaned.push(symptom.to_string());
        }

        if cleaned.is_empty() {
            return Err(TriageError::validation(
                "symptoms",
                "At least one symptom is required.",
            ));
        }
        Ok(Self(cleaned))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive whole-symptom membership test.
    pub fn contains_any(&self, keywords: &[&str]) -> bool {
        self.0
            .iter()
            .map(|s| s.to_lowercase())
            .any(|s| keywords.contains(&s.as_str()))
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Declared kind of an uploaded report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Xray,
    Ct,
    Mri,
    Ultrasound,
    Ecg,
    Brain,
    Organ,
    Chest,
    Mammogram,
    Breast,
    Blood,
    Lab,
    Prescription,
    Pathology,
    Unrecognized,
}

/// Processing path a report is sent down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Image,
    Text,
    Generic,
}

impl ReportKind {
    fn from_label(label: &str) -> Self {
        match label {
            "xray" => ReportKind::Xray,
            "ct" | "ctscan" => ReportKind::Ct,
            "mri" => ReportKind::Mri,
            "ultrasound" => ReportKind::Ultrasound,
            "ecg" | "ekg" => ReportKind::Ecg,
            "brain" => ReportKind::Brain,
            "organ" => ReportKind::Organ,
            "chest" => ReportKind::Chest,
            "mammogram" => ReportKind::Mammogram,
            "breast" => ReportKind::Breast,
            "blood" | "bloodreport" => ReportKind::Blood,
            "lab" | "labreport" => ReportKind::Lab,
            "prescription" => ReportKind::Prescription,
            "pathology" => ReportKind::Pathology,
            _ => ReportKind::Unrecognized,
        }
    }

    pub fn route(&self) -> Route {
        match self {
            ReportKind::Xray
            | ReportKind::Ct
            | ReportKind::Mri
            | ReportKind::Ultrasound
            | ReportKind::Ecg
            | ReportKind::Brain
            | ReportKind::Organ
            | ReportKind::Chest
            | ReportKind::Mammogram
            | ReportKind::Breast => Route::Image,
            ReportKind::Blood | ReportKind::Lab | ReportKind::Prescription | ReportKind::Pathology => {
                Route::Text
            }
            ReportKind::Unrecognized => Route::Generic,
        }
    }
}

/// A report type as submitted by the user, with its resolved kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportType {
    label: String,
    kind: ReportKind,
}

impl ReportType {
    pub fn parse(raw: &str) -> Result<Self> {
        let label = raw.trim().to_lowercase();
        if label.is_empty() {
            return Err(TriageError::validation(
                "report_type",
                "Report type is required",
            ));
        }
        let kind = ReportKind::from_label(&label);
        Ok(Self { label, kind })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn route(&self) -> Route {
        self.kind.route()
    }

    /// Display form used in verdicts, e.g. `xray` becomes `Xray`.
    pub fn title(&self) -> String {
        title_case(&self.label)
    }
}

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct FileBlob {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Output of a single classifier forward pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    /// Percentage in `[0, 100]`.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: String,
    pub finding: String,
    pub severity: Severity,
    pub description: String,
}

/// Complete structured output of the report pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredVerdict {
    pub report_type: String,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
    pub urgency: Urgency,
    pub summary: String,
    pub confidence: f64,
}

impl StructuredVerdict {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.findings.is_empty() {
            return Err("verdict has no findings".to_string());
        }
        check_percentage("confidence", self.confidence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseCandidate {
    pub name: String,
    pub probability: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub instructions: String,
}

/// Disease-shaped verdict produced by the prediction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionVerdict {
    pub diseases: Vec<DiseaseCandidate>,
    pub medications: Vec<Medication>,
    pub recommendations: Vec<String>,
    pub urgency: Urgency,
    pub confidence_score: f64,
}

impl PredictionVerdict {
    pub fn top_disease(&self) -> Option<&DiseaseCandidate> {
        top_candidate(&self.diseases)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.diseases.is_empty() {
            return Err("verdict has no disease candidates".to_string());
        }
        for disease in &self.diseases {
            check_percentage("probability", disease.probability)?;
        }
        check_percentage("confidence_score", self.confidence_score)
    }
}

/// Highest-probability candidate; ties go to the earliest entry.
pub fn top_candidate(candidates: &[DiseaseCandidate]) -> Option<&DiseaseCandidate> {
    let mut best: Option<&DiseaseCandidate> = None;
    for candidate in candidates {
        match best {
            Some(current) if candidate.probability <= current.probability => {}
            _ => best = Some(candidate),
        }
    }
    best
}

fn check_percentage(field: &str, value: f64) -> std::result::Result<(), String> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} {} is outside [0, 100]", field, value))
    }
}

/// Authenticated caller. Records are always scoped to one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
