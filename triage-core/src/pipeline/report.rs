use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::advisor::Advisor;
use crate::classifier::{ImageClassifier, decode_image};
use crate::error::{Result, TriageError};
use crate::extract::extract_as;
use crate::fallback::fallback_report;
use crate::humanize::humanize;
use crate::models::{
    ClassificationResult, FileBlob, Finding, ReportType, Route, Severity, StructuredVerdict,
    Urgency,
};
use crate::ocr::TextExtractor;
use crate::prompts::{
    UNKNOWN_FINDING, narrative_request, parse_narrative, report_analysis_request,
    urgency_request,
};

/// Routes an uploaded report to the image, text or generic path and always
/// ends in a complete verdict or a typed error.
pub struct ReportPipeline {
    classifier: Arc<dyn ImageClassifier>,
    advisor: Option<Arc<dyn Advisor>>,
    ocr: Option<Arc<dyn TextExtractor>>,
}

impl ReportPipeline {
    pub fn new(
        classifier: Arc<dyn ImageClassifier>,
        advisor: Option<Arc<dyn Advisor>>,
        ocr: Option<Arc<dyn TextExtractor>>,
    ) -> Self {
        Self {
            classifier,
            advisor,
            ocr,
        }
    }

    /// Only the first file is analyzed; the rest are accepted and ignored.
    pub async fn analyze(
        &self,
        report_type: &str,
        files: &[FileBlob],
        notes: &str,
    ) -> Result<StructuredVerdict> {
        let first = files
            .first()
            .ok_or_else(|| TriageError::validation("files", "No files uploaded"))?;
        let report_type = ReportType::parse(report_type)?;

        info!(
            report_type = %report_type.label(),
            route = ?report_type.route(),
            files = files.len(),
            "Analyzing report"
        );
        if files.len() > 1 {
            debug!("Ignoring {} additional files", files.len() - 1);
        }

        match report_type.route() {
            Route::Image => self.analyze_image(&report_type, first, notes).await,
            Route::Text => Ok(self.analyze_text(&report_type, first, notes).await),
            Route::Generic => {
                info!("No dedicated path for report type, using fallback analysis");
                Ok(fallback_report(&report_type))
            }
        }
    }

    async fn analyze_image(
        &self,
        report_type: &ReportType,
        file: &FileBlob,
        notes: &str,
    ) -> Result<StructuredVerdict> {
        let classification = self.classify(file).await?;
        let finding = humanize(&classification.label);
        let severity = Severity::from_label(&finding);

        info!(
            raw_label = %classification.label,
            finding = %finding,
            confidence = classification.confidence,
            "Image classified"
        );

        let urgency = self.score_urgency(&finding).await;
        let narrative = self.interpret(&finding, report_type.label(), notes).await;

        let recommendation = match severity {
            Severity::Normal => "Routine follow-up",
            Severity::Abnormal => "Consult specialist if abnormal",
        };

        Ok(StructuredVerdict {
            report_type: report_type.title(),
            findings: vec![Finding {
                category: "Image Analysis".to_string(),
                finding,
                severity,
                description: narrative.clone(),
            }],
            recommendations: vec![recommendation.to_string()],
            urgency,
            summary: narrative,
            confidence: classification.confidence,
        })
    }

    /// Decode and inference run off the async runtime. Both failures are hard errors.
    async fn classify(&self, file: &FileBlob) -> Result<ClassificationResult> {
        let classifier = Arc::clone(&self.classifier);
        let bytes = file.bytes.clone();

        let result = tokio::task::spawn_blocking(move || {
            let image = decode_image(&bytes)?;
            classifier.classify(&image)
        })
        .await
        .map_err(|e| TriageError::Inference(format!("classifier task failed: {}", e)))?;

        result.map_err(TriageError::from)
    }

    async fn score_urgency(&self, finding: &str) -> Urgency {
        let Some(advisor) = &self.advisor else {
            debug!("No advisor configured, using default urgency");
            return Urgency::default();
        };

        match advisor.query(urgency_request(finding)).await {
            Ok(raw) => Urgency::parse_strict(&raw).unwrap_or_else(|| {
                warn!(response = %raw.trim(), "Unrecognized urgency response, using default");
                Urgency::default()
            }),
            Err(e) => {
                warn!("Urgency request failed: {}", e);
                Urgency::default()
            }
        }
    }

    async fn interpret(&self, finding: &str, report_type: &str, notes: &str) -> String {
        let Some(advisor) = &self.advisor else {
            return UNKNOWN_FINDING.to_string();
        };

        match advisor
            .query(narrative_request(finding, report_type, notes))
            .await
        {
            Ok(raw) => parse_narrative(&raw),
            Err(e) => {
                warn!("Narrative request failed: {}", e);
                UNKNOWN_FINDING.to_string()
            }
        }
    }

    async fn analyze_text(
        &self,
        report_type: &ReportType,
        file: &FileBlob,
        notes: &str,
    ) -> StructuredVerdict {
        let (Some(ocr), Some(advisor)) = (&self.ocr, &self.advisor) else {
            info!("OCR or advisor not configured, using fallback analysis");
            return fallback_report(report_type);
        };

        let text = match ocr.extract_text(file).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!(file = %file.name, "OCR returned no text, using fallback analysis");
                return fallback_report(report_type);
            }
            Err(e) => {
                warn!(file = %file.name, "OCR failed: {}", e);
                return fallback_report(report_type);
            }
        };

        let content = format!("{}\n\n{}", text, notes);
        let raw = match advisor
            .query(report_analysis_request(report_type.label(), &content))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Report analysis request failed: {}", e);
                return fallback_report(report_type);
            }
        };

        match extract_as::<RawReportVerdict>(&raw).and_then(|r| r.into_verdict(report_type)) {
            Some(verdict) => verdict,
            None => {
                warn!("Advisor response had no usable report JSON, using fallback analysis");
                fallback_report(report_type)
            }
        }
    }
}

/// Report shape as emitted by the advisor, before normalization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReportVerdict {
    #[serde(default)]
    report_type: Option<String>,
    #[serde(default)]
    findings: Vec<RawFinding>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    urgency: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawFinding {
    #[serde(default)]
    category: String,
    finding: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    description: String,
}

impl RawReportVerdict {
    fn into_verdict(self, report_type: &ReportType) -> Option<StructuredVerdict> {
        let summary = self.summary.filter(|s| !s.trim().is_empty())?;
        if self.findings.is_empty() {
            return None;
        }

        Some(StructuredVerdict {
            report_type: self
                .report_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| format!("{} Report", report_type.title())),
            findings: self
                .findings
                .into_iter()
                .map(|f| Finding {
                    category: f.category,
                    severity: Severity::from_label(&f.severity),
                    finding: f.finding,
                    description: f.description,
                })
                .collect(),
            recommendations: self.recommendations,
            urgency: self
                .urgency
                .as_deref()
                .and_then(Urgency::parse_strict)
                .unwrap_or_default(),
            summary,
            confidence: self.confidence.unwrap_or(0.0).clamp(0.0, 100.0),
        })
    }
}
