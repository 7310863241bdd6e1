//! Persistence of completed verdicts and the symptom catalogue.
//!
//! Every verdict record belongs to exactly one user and every read is scoped
//! to that user. Saves validate the verdict first and reject records that
//! violate the verdict invariants. Catalogue symptoms are shared.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{
    DiseaseCandidate, Medication, PredictionVerdict, StructuredVerdict, SymptomSet, Urgency,
    UserId,
};

pub mod catalog;
pub mod memory;
pub mod postgres;

pub use catalog::{
    CategoryEntry, SeedOutcome, Symptom, SymptomCatalog, SymptomListing, group_by_category,
    seed_samples,
};
pub use memory::{InMemorySymptomCatalog, InMemoryVerdictStore};
pub use postgres::{PostgresSymptomCatalog, PostgresVerdictStore};

/// Model tag stored on records when the caller doesn't name one.
pub const DEFAULT_AI_MODEL: &str = "groq-llama3";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

#[async_trait]
pub trait VerdictStore: Send + Sync {
    async fn save_prediction(
        &self,
        user: &UserId,
        prediction: NewPrediction,
    ) -> Result<PredictionRecord, StorageError>;

    async fn save_report(
        &self,
        user: &UserId,
        report: NewReport,
    ) -> Result<ReportRecord, StorageError>;

    /// Newest first.
    async fn list_predictions(
        &self,
        user: &UserId,
        page: PageRequest,
    ) -> Result<Page<PredictionSummary>, StorageError>;

    async fn get_prediction(
        &self,
        user: &UserId,
        id: Uuid,
    ) -> Result<Option<PredictionRecord>, StorageError>;

    async fn prediction_stats(&self, user: &UserId) -> Result<PredictionStats, StorageError>;
}

#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub symptoms: SymptomSet,
    pub additional_info: String,
    pub verdict: PredictionVerdict,
    pub ai_model_used: String,
}

impl NewPrediction {
    pub fn new(symptoms: SymptomSet, additional_info: impl Into<String>, verdict: PredictionVerdict) -> Self {
        Self {
            symptoms,
            additional_info: additional_info.into(),
            verdict,
            ai_model_used: DEFAULT_AI_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub report_type: String,
    pub file_names: Vec<String>,
    pub additional_notes: String,
    pub verdict: StructuredVerdict,
    pub ai_model_used: String,
}

impl NewReport {
    pub fn new(
        report_type: impl Into<String>,
        file_names: Vec<String>,
        additional_notes: impl Into<String>,
        verdict: StructuredVerdict,
    ) -> Self {
        Self {
            report_type: report_type.into(),
            file_names,
            additional_notes: additional_notes.into(),
            verdict,
            ai_model_used: DEFAULT_AI_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub id: Uuid,
    #[serde(skip)]
    pub user: UserId,
    pub symptoms: Vec<String>,
    pub additional_info: String,
    pub predicted_diseases: Vec<DiseaseCandidate>,
    pub medications: Vec<Medication>,
    pub recommendations: Vec<String>,
    pub urgency: Urgency,
    pub confidence_score: f64,
    pub top_disease: Option<DiseaseCandidate>,
    pub ai_model_used: String,
    pub created_at: DateTime<Utc>,
}

impl PredictionRecord {
    /// Validates and stamps a new record with a fresh id and the current time.
    pub fn create(user: &UserId, prediction: NewPrediction) -> Result<Self, StorageError> {
        prediction
            .verdict
            .validate()
            .map_err(StorageError::InvalidRecord)?;

        let verdict = prediction.verdict;
        Ok(Self {
            id: Uuid::new_v4(),
            user: user.clone(),
            symptoms: prediction.symptoms.into_vec(),
            additional_info: prediction.additional_info,
            top_disease: verdict.top_disease().cloned(),
            predicted_diseases: verdict.diseases,
            medications: verdict.medications,
            recommendations: verdict.recommendations,
            urgency: verdict.urgency,
            confidence_score: verdict.confidence_score,
            ai_model_used: prediction.ai_model_used,
            created_at: Utc::now(),
        })
    }

    pub fn summary(&self) -> PredictionSummary {
        PredictionSummary {
            id: self.id,
            symptoms: self.symptoms.clone(),
            top_disease: self.top_disease.as_ref().map(|d| TopDisease {
                name: d.name.clone(),
                probability: d.probability,
            }),
            urgency: self.urgency,
            created_at: self.created_at,
            confidence_score: self.confidence_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    pub id: Uuid,
    #[serde(skip)]
    pub user: UserId,
    pub report_type: String,
    pub file_names: Vec<String>,
    pub additional_notes: String,
    pub verdict: StructuredVerdict,
    pub ai_model_used: String,
    pub created_at: DateTime<Utc>,
}

impl ReportRecord {
    pub fn create(user: &UserId, report: NewReport) -> Result<Self, StorageError> {
        report
            .verdict
            .validate()
            .map_err(StorageError::InvalidRecord)?;

        Ok(Self {
            id: Uuid::new_v4(),
            user: user.clone(),
            report_type: report.report_type,
            file_names: report.file_names,
            additional_notes: report.additional_notes,
            verdict: report.verdict,
            ai_model_used: report.ai_model_used,
            created_at: Utc::now(),
        })
    }
}

/// History row: the record without its full verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub id: Uuid,
    pub symptoms: Vec<String>,
    pub top_disease: Option<TopDisease>,
    pub urgency: Urgency,
    pub created_at: DateTime<Utc>,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopDisease {
    pub name: String,
    pub probability: f64,
}

/// 1-based page request. Out-of-range values are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u32,
    pub page_size: u32,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(count: u64, request: PageRequest, results: Vec<T>) -> Self {
        let seen = request.offset() + results.len() as u64;
        Self {
            count,
            page: request.page,
            page_size: request.page_size,
            next: (seen < count).then(|| request.page + 1),
            previous: (request.page > 1).then(|| request.page - 1),
            results,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UrgencyBreakdown {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl UrgencyBreakdown {
    pub fn add(&mut self, urgency: Urgency, count: u64) {
        match urgency {
            Urgency::Low => self.low += count,
            Urgency::Medium => self.medium += count,
            Urgency::High => self.high += count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionStats {
    pub total_predictions: u64,
    pub avg_confidence: f64,
    pub last_prediction: Option<DateTime<Utc>>,
    pub urgency_breakdown: UrgencyBreakdown,
}

impl PredictionStats {
    pub fn empty() -> Self {
        Self {
            total_predictions: 0,
            avg_confidence: 0.0,
            last_prediction: None,
            urgency_breakdown: UrgencyBreakdown::default(),
        }
    }
}

/// Rounds to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
