use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use super::catalog::{Symptom, SymptomCatalog};
use super::{
    NewPrediction, NewReport, Page, PageRequest, PredictionRecord, PredictionStats,
    PredictionSummary, ReportRecord, UrgencyBreakdown, VerdictStore, round1,
};
use crate::error::StorageError;
use crate::models::UserId;

/// In-memory store for development and tests. Insertion sequence breaks
/// timestamp ties so "newest first" is stable.
#[derive(Default)]
pub struct InMemoryVerdictStore {
    predictions: Arc<DashMap<Uuid, (u64, PredictionRecord)>>,
    reports: Arc<DashMap<Uuid, ReportRecord>>,
    sequence: AtomicU64,
}

impl InMemoryVerdictStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_count(&self) -> usize {
        self.reports.len()
    }

    pub fn get_report(&self, id: Uuid) -> Option<ReportRecord> {
        self.reports.get(&id).map(|entry| entry.clone())
    }

    fn user_predictions(&self, user: &UserId) -> Vec<(u64, PredictionRecord)> {
        let mut records: Vec<(u64, PredictionRecord)> = self
            .predictions
            .iter()
            .filter(|entry| &entry.value().1.user == user)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        records
    }
}

#[async_trait]
impl VerdictStore for InMemoryVerdictStore {
    async fn save_prediction(
        &self,
        user: &UserId,
        prediction: NewPrediction,
    ) -> Result<PredictionRecord, StorageError> {
        let record = PredictionRecord::create(user, prediction)?;
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.predictions.insert(record.id, (seq, record.clone()));
        Ok(record)
    }

    async fn save_report(
        &self,
        user: &UserId,
        report: NewReport,
    ) -> Result<ReportRecord, StorageError> {
        let record = ReportRecord::create(user, report)?;
        self.reports.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_predictions(
        &self,
        user: &UserId,
        page: PageRequest,
    ) -> Result<Page<PredictionSummary>, StorageError> {
        let records = self.user_predictions(user);
        let count = records.len() as u64;
        let results = records
            .iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .map(|(_, record)| record.summary())
            .collect();
        Ok(Page::new(count, page, results))
    }

    async fn get_prediction(
        &self,
        user: &UserId,
        id: Uuid,
    ) -> Result<Option<PredictionRecord>, StorageError> {
        Ok(self
            .predictions
            .get(&id)
            .filter(|entry| &entry.value().1.user == user)
            .map(|entry| entry.value().1.clone()))
    }

    async fn prediction_stats(&self, user: &UserId) -> Result<PredictionStats, StorageError> {
        let records = self.user_predictions(user);
        if records.is_empty() {
            return Ok(PredictionStats::empty());
        }

        let total = records.len() as u64;
        let mut breakdown = UrgencyBreakdown::default();
        let mut confidence_sum = 0.0;
        for (_, record) in &records {
            breakdown.add(record.urgency, 1);
            confidence_sum += record.confidence_score;
        }

        Ok(PredictionStats {
            total_predictions: total,
            avg_confidence: round1(confidence_sum / total as f64),
            last_prediction: records.first().map(|(_, r)| r.created_at),
            urgency_breakdown: breakdown,
        })
    }
}

/// Symptom catalogue keyed by name.
#[derive(Default)]
pub struct InMemorySymptomCatalog {
    symptoms: Arc<DashMap<String, Symptom>>,
}

impl InMemorySymptomCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn matching(&self, keep: impl Fn(&Symptom) -> bool) -> Vec<Symptom> {
        self.symptoms
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl SymptomCatalog for InMemorySymptomCatalog {
    async fn list(&self) -> Result<Vec<Symptom>, StorageError> {
        let mut symptoms = self.matching(|_| true);
        symptoms.sort_by(|a, b| a.category.cmp(&b.category).then(a.name.cmp(&b.name)));
        Ok(symptoms)
    }

    async fn search(&self, query: &str) -> Result<Vec<Symptom>, StorageError> {
        let needle = query.to_lowercase();
        let mut symptoms = self.matching(|s| s.name.to_lowercase().contains(&needle));
        symptoms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(symptoms)
    }

    async fn insert_if_absent(&self, symptom: Symptom) -> Result<bool, StorageError> {
        match self.symptoms.entry(symptom.name.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(symptom);
                Ok(true)
            }
        }
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.symptoms.len() as u64)
    }
}
