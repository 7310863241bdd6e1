//! Authenticated entry point: runs a pipeline and records the verdict.

use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{Result, TriageError};
use crate::models::{FileBlob, ReportType, SymptomSet, UserId};
use crate::pipeline::{PredictionPipeline, ReportPipeline};
use crate::storage::{
    NewPrediction, NewReport, Page, PageRequest, PredictionRecord, PredictionStats,
    PredictionSummary, ReportRecord, VerdictStore,
};

pub struct TriageDesk {
    reports: ReportPipeline,
    predictions: PredictionPipeline,
    store: Arc<dyn VerdictStore>,
}

impl TriageDesk {
    pub fn new(
        reports: ReportPipeline,
        predictions: PredictionPipeline,
        store: Arc<dyn VerdictStore>,
    ) -> Self {
        Self {
            reports,
            predictions,
            store,
        }
    }

    pub async fn create_prediction(
        &self,
        user: Option<&UserId>,
        symptoms: Vec<String>,
        additional_info: &str,
    ) -> Result<PredictionRecord> {
        let user = require_user(user)?;
        let symptoms = SymptomSet::new(symptoms)?;

        let verdict = self.predictions.predict(&symptoms, additional_info).await;
        let record = self
            .store
            .save_prediction(user, NewPrediction::new(symptoms, additional_info, verdict))
            .await
            .inspect_err(|e| error!(user = %user, "Failed to save prediction: {}", e))?;

        info!(user = %user, prediction_id = %record.id, "Prediction saved");
        Ok(record)
    }

    /// The user check runs before anything touches the upload.
    pub async fn analyze_report(
        &self,
        user: Option<&UserId>,
        report_type: &str,
        files: Vec<FileBlob>,
        notes: &str,
    ) -> Result<ReportRecord> {
        let user = require_user(user)?;
        let report_type = ReportType::parse(report_type)?;

        let verdict = self
            .reports
            .analyze(report_type.label(), &files, notes)
            .await?;
        let file_names = files.into_iter().map(|f| f.name).collect();
        let record = self
            .store
            .save_report(
                user,
                NewReport::new(report_type.label(), file_names, notes, verdict),
            )
            .await
            .inspect_err(|e| error!(user = %user, "Failed to save report: {}", e))?;

        info!(user = %user, report_id = %record.id, "Report analysis saved");
        Ok(record)
    }

    pub async fn prediction_history(
        &self,
        user: Option<&UserId>,
        page: PageRequest,
    ) -> Result<Page<PredictionSummary>> {
        let user = require_user(user)?;
        Ok(self.store.list_predictions(user, page).await?)
    }

    pub async fn prediction(
        &self,
        user: Option<&UserId>,
        id: Uuid,
    ) -> Result<Option<PredictionRecord>> {
        let user = require_user(user)?;
        Ok(self.store.get_prediction(user, id).await?)
    }

    pub async fn prediction_stats(&self, user: Option<&UserId>) -> Result<PredictionStats> {
        let user = require_user(user)?;
        Ok(self.store.prediction_stats(user).await?)
    }
}

fn require_user(user: Option<&UserId>) -> Result<&UserId> {
    user.ok_or(TriageError::AuthenticationRequired)
}
