use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::catalog::{Symptom, SymptomCatalog};
use super::{
    NewPrediction, NewReport, Page, PageRequest, PredictionRecord, PredictionStats,
    PredictionSummary, ReportRecord, UrgencyBreakdown, VerdictStore, round1,
};
use crate::error::StorageError;
use crate::models::{DiseaseCandidate, Medication, Urgency, UserId};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS predictions (
        id UUID PRIMARY KEY,
        seq BIGSERIAL,
        user_id TEXT NOT NULL,
        symptoms JSONB NOT NULL,
        additional_info TEXT NOT NULL DEFAULT '',
        predicted_diseases JSONB NOT NULL,
        medications JSONB NOT NULL,
        recommendations JSONB NOT NULL,
        urgency TEXT NOT NULL CHECK (urgency IN ('low', 'medium', 'high')),
        confidence_score DOUBLE PRECISION NOT NULL,
        ai_model_used TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    "ALTER TABLE predictions ADD COLUMN IF NOT EXISTS seq BIGSERIAL",
    "CREATE INDEX IF NOT EXISTS predictions_user_created_idx ON predictions (user_id, created_at DESC, seq DESC)",
    r#"CREATE TABLE IF NOT EXISTS medical_reports (
        id UUID PRIMARY KEY,
        user_id TEXT NOT NULL,
        report_type TEXT NOT NULL,
        file_names JSONB NOT NULL,
        additional_notes TEXT NOT NULL DEFAULT '',
        verdict JSONB NOT NULL,
        urgency TEXT NOT NULL CHECK (urgency IN ('low', 'medium', 'high')),
        confidence_score DOUBLE PRECISION NOT NULL,
        ai_model_used TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS medical_reports_user_created_idx ON medical_reports (user_id, created_at DESC)",
    r#"CREATE TABLE IF NOT EXISTS symptoms (
        id UUID PRIMARY KEY,
        name VARCHAR(100) NOT NULL UNIQUE,
        category VARCHAR(50) NOT NULL,
        severity_indicators JSONB NOT NULL,
        related_conditions JSONB NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    )"#,
    "CREATE INDEX IF NOT EXISTS symptoms_category_idx ON symptoms (category, name)",
];

const SYMPTOM_COLUMNS: &str =
    "id, name, category, severity_indicators, related_conditions, description";

const PREDICTION_COLUMNS: &str = "id, user_id, symptoms, additional_info, predicted_diseases, \
     medications, recommendations, urgency, confidence_score, ai_model_used, created_at";

/// Newest first. `seq` orders rows that share a timestamp by insertion.
const NEWEST_FIRST: &str = "ORDER BY created_at DESC, seq DESC";

/// Postgres-backed store. Verdict bodies live in JSONB columns.
pub struct PostgresVerdictStore {
    pool: PgPool,
}

impl PostgresVerdictStore {
    /// Connects and creates the schema if it does not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!("Connected to Postgres verdict store");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Symptom catalogue on the same pool and schema.
    pub fn symptom_catalog(&self) -> PostgresSymptomCatalog {
        PostgresSymptomCatalog {
            pool: self.pool.clone(),
        }
    }
}

pub struct PostgresSymptomCatalog {
    pool: PgPool,
}

#[derive(FromRow)]
struct SymptomRow {
    id: Uuid,
    name: String,
    category: String,
    severity_indicators: Json<Vec<String>>,
    related_conditions: Json<Vec<String>>,
    description: String,
}

impl From<SymptomRow> for Symptom {
    fn from(row: SymptomRow) -> Self {
        Symptom {
            id: row.id,
            name: row.name,
            category: row.category,
            severity_indicators: row.severity_indicators.0,
            related_conditions: row.related_conditions.0,
            description: row.description,
        }
    }
}

#[async_trait]
impl SymptomCatalog for PostgresSymptomCatalog {
    async fn list(&self) -> Result<Vec<Symptom>, StorageError> {
        let rows: Vec<SymptomRow> = sqlx::query_as(&format!(
            "SELECT {SYMPTOM_COLUMNS} FROM symptoms ORDER BY category, name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Symptom::from).collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<Symptom>, StorageError> {
        // strpos keeps `%` and `_` in the query literal.
        let rows: Vec<SymptomRow> = sqlx::query_as(&format!(
            "SELECT {SYMPTOM_COLUMNS} FROM symptoms \
             WHERE strpos(lower(name), lower($1)) > 0 ORDER BY name"
        ))
        .bind(query)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Symptom::from).collect())
    }

    async fn insert_if_absent(&self, symptom: Symptom) -> Result<bool, StorageError> {
        let result = sqlx::query(&format!(
            "INSERT INTO symptoms ({SYMPTOM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (name) DO NOTHING"
        ))
        .bind(symptom.id)
        .bind(&symptom.name)
        .bind(&symptom.category)
        .bind(Json(&symptom.severity_indicators))
        .bind(Json(&symptom.related_conditions))
        .bind(&symptom.description)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM symptoms")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[derive(FromRow)]
struct PredictionRow {
    id: Uuid,
    user_id: String,
    symptoms: Json<Vec<String>>,
    additional_info: String,
    predicted_diseases: Json<Vec<DiseaseCandidate>>,
    medications: Json<Vec<Medication>>,
    recommendations: Json<Vec<String>>,
    urgency: String,
    confidence_score: f64,
    ai_model_used: String,
    created_at: DateTime<Utc>,
}

impl PredictionRow {
    fn into_record(self) -> Result<PredictionRecord, StorageError> {
        let urgency = parse_stored_urgency(&self.urgency)?;
        let diseases = self.predicted_diseases.0;
        Ok(PredictionRecord {
            id: self.id,
            user: UserId::new(self.user_id),
            symptoms: self.symptoms.0,
            additional_info: self.additional_info,
            top_disease: crate::models::top_candidate(&diseases).cloned(),
            predicted_diseases: diseases,
            medications: self.medications.0,
            recommendations: self.recommendations.0,
            urgency,
            confidence_score: self.confidence_score,
            ai_model_used: self.ai_model_used,
            created_at: self.created_at,
        })
    }
}

fn parse_stored_urgency(raw: &str) -> Result<Urgency, StorageError> {
    Urgency::parse_strict(raw)
        .ok_or_else(|| StorageError::InvalidRecord(format!("stored urgency '{}'", raw)))
}

#[async_trait]
impl VerdictStore for PostgresVerdictStore {
    async fn save_prediction(
        &self,
        user: &UserId,
        prediction: NewPrediction,
    ) -> Result<PredictionRecord, StorageError> {
        let record = PredictionRecord::create(user, prediction)?;

        sqlx::query(&format!(
            "INSERT INTO predictions ({PREDICTION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(record.id)
        .bind(record.user.as_str())
        .bind(Json(&record.symptoms))
        .bind(&record.additional_info)
        .bind(Json(&record.predicted_diseases))
        .bind(Json(&record.medications))
        .bind(Json(&record.recommendations))
        .bind(record.urgency.as_str())
        .bind(record.confidence_score)
        .bind(&record.ai_model_used)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn save_report(
        &self,
        user: &UserId,
        report: NewReport,
    ) -> Result<ReportRecord, StorageError> {
        let record = ReportRecord::create(user, report)?;

        sqlx::query(
            "INSERT INTO medical_reports (id, user_id, report_type, file_names, additional_notes, \
             verdict, urgency, confidence_score, ai_model_used, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(record.id)
        .bind(record.user.as_str())
        .bind(&record.report_type)
        .bind(Json(&record.file_names))
        .bind(&record.additional_notes)
        .bind(Json(&record.verdict))
        .bind(record.verdict.urgency.as_str())
        .bind(record.verdict.confidence)
        .bind(&record.ai_model_used)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_predictions(
        &self,
        user: &UserId,
        page: PageRequest,
    ) -> Result<Page<PredictionSummary>, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM predictions WHERE user_id = $1")
            .bind(user.as_str())
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<PredictionRow> = sqlx::query_as(&format!(
            "SELECT {PREDICTION_COLUMNS} FROM predictions WHERE user_id = $1 \
             {NEWEST_FIRST} LIMIT $2 OFFSET $3"
        ))
        .bind(user.as_str())
        .bind(i64::from(page.page_size))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let results = rows
            .into_iter()
            .map(|row| row.into_record().map(|r| r.summary()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(count.max(0) as u64, page, results))
    }

    async fn get_prediction(
        &self,
        user: &UserId,
        id: Uuid,
    ) -> Result<Option<PredictionRecord>, StorageError> {
        let row: Option<PredictionRow> = sqlx::query_as(&format!(
            "SELECT {PREDICTION_COLUMNS} FROM predictions WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PredictionRow::into_record).transpose()
    }

    async fn prediction_stats(&self, user: &UserId) -> Result<PredictionStats, StorageError> {
        let (total, avg, last): (i64, f64, Option<DateTime<Utc>>) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(AVG(confidence_score), 0)::DOUBLE PRECISION, MAX(created_at) \
             FROM predictions WHERE user_id = $1",
        )
        .bind(user.as_str())
        .fetch_one(&self.pool)
        .await?;

        if total == 0 {
            return Ok(PredictionStats::empty());
        }

        let counts: Vec<(String, i64)> = sqlx::query_as(
            "SELECT urgency, COUNT(*) FROM predictions WHERE user_id = $1 GROUP BY urgency",
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut breakdown = UrgencyBreakdown::default();
        for (urgency, count) in counts {
            breakdown.add(parse_stored_urgency(&urgency)?, count.max(0) as u64);
        }

        Ok(PredictionStats {
            total_predictions: total as u64,
            avg_confidence: round1(avg),
            last_prediction: last,
            urgency_breakdown: breakdown,
        })
    }
}
