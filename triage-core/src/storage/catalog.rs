//! Reference catalogue of symptoms, browsable without authentication.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::error::StorageError;

pub const MAX_SYMPTOM_NAME_LEN: usize = 100;
pub const MAX_CATEGORY_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symptom {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub severity_indicators: Vec<String>,
    pub related_conditions: Vec<String>,
    pub description: String,
}

impl Symptom {
    /// Rejects blank or oversized names and categories.
    pub fn new(
        name: &str,
        category: &str,
        severity_indicators: &[&str],
        related_conditions: &[&str],
        description: &str,
    ) -> Result<Self, StorageError> {
        let name = name.trim();
        let category = category.trim();
        if name.is_empty() || name.chars().count() > MAX_SYMPTOM_NAME_LEN {
            return Err(StorageError::InvalidRecord(format!(
                "symptom name must be 1 to {MAX_SYMPTOM_NAME_LEN} characters"
            )));
        }
        if category.is_empty() || category.chars().count() > MAX_CATEGORY_LEN {
            return Err(StorageError::InvalidRecord(format!(
                "symptom category must be 1 to {MAX_CATEGORY_LEN} characters"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: category.to_string(),
            severity_indicators: severity_indicators.iter().map(|s| s.to_string()).collect(),
            related_conditions: related_conditions.iter().map(|s| s.to_string()).collect(),
            description: description.to_string(),
        })
    }

    pub fn listing(&self) -> SymptomListing {
        SymptomListing {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
        }
    }
}

/// List and search row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomListing {
    pub id: Uuid,
    pub name: String,
    pub category: String,
}

/// Entry under a category heading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEntry {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub created: u64,
    pub total: u64,
}

/// Names are unique across the catalogue.
#[async_trait]
pub trait SymptomCatalog: Send + Sync {
    /// Ordered by category, then name.
    async fn list(&self) -> Result<Vec<Symptom>, StorageError>;

    /// Case-insensitive substring match on the name, ordered by name.
    async fn search(&self, query: &str) -> Result<Vec<Symptom>, StorageError>;

    /// Returns false when a symptom with the same name already exists.
    async fn insert_if_absent(&self, symptom: Symptom) -> Result<bool, StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;
}

/// Groups an already ordered listing under its categories.
pub fn group_by_category(symptoms: &[Symptom]) -> BTreeMap<String, Vec<CategoryEntry>> {
    let mut groups: BTreeMap<String, Vec<CategoryEntry>> = BTreeMap::new();
    for symptom in symptoms {
        groups
            .entry(symptom.category.clone())
            .or_default()
            .push(CategoryEntry {
                id: symptom.id,
                name: symptom.name.clone(),
            });
    }
    groups
}

/// Inserts the sample symptoms, skipping names already present.
pub async fn seed_samples(catalog: &dyn SymptomCatalog) -> Result<SeedOutcome, StorageError> {
    let mut created = 0;
    for symptom in sample_symptoms()? {
        if catalog.insert_if_absent(symptom).await? {
            created += 1;
        }
    }
    let total = catalog.count().await?;
    info!(created, total, "Seeded sample symptoms");
    Ok(SeedOutcome { created, total })
}

pub fn sample_symptoms() -> Result<Vec<Symptom>, StorageError> {
    [
        Symptom::new(
            "Fever",
            "General",
            &["high temperature above 101°F", "chills", "sweating"],
            &["infection", "inflammation", "immune response"],
            "Elevated body temperature, often indicating infection or illness",
        ),
        Symptom::new(
            "Headache",
            "Neurological",
            &["severe pain", "vision changes", "neck stiffness"],
            &["tension", "migraine", "cluster headache", "sinus"],
            "Pain in the head or neck region",
        ),
        Symptom::new(
            "Cough",
            "Respiratory",
            &["blood in sputum", "persistent for weeks", "difficulty breathing"],
            &["cold", "bronchitis", "pneumonia", "asthma"],
            "Forceful expulsion of air from the lungs",
        ),
        Symptom::new(
            "Chest Pain",
            "Cardiovascular",
            &["crushing pain", "radiating to arm", "shortness of breath"],
            &["heart attack", "angina", "anxiety", "muscle strain"],
            "Pain or discomfort in the chest area",
        ),
        Symptom::new(
            "Nausea",
            "Gastrointestinal",
            &["persistent vomiting", "dehydration", "blood in vomit"],
            &[
                "gastroenteritis",
                "food poisoning",
                "pregnancy",
                "medication side effect",
            ],
            "Feeling of sickness with inclination to vomit",
        ),
        Symptom::new(
            "Fatigue",
            "General",
            &["extreme exhaustion", "inability to perform daily tasks"],
            &["viral infection", "anemia", "depression", "sleep disorders"],
            "Extreme tiredness or lack of energy",
        ),
        Symptom::new(
            "Shortness of Breath",
            "Respiratory",
            &["at rest", "blue lips or fingernails", "chest tightness"],
            &["asthma", "heart failure", "anxiety", "pneumonia"],
            "Difficulty breathing or feeling breathless",
        ),
        Symptom::new(
            "Dizziness",
            "Neurological",
            &["fainting", "loss of balance", "hearing changes"],
            &["inner ear problems", "low blood pressure", "dehydration"],
            "Feeling unsteady or lightheaded",
        ),
    ]
    .into_iter()
    .collect()
}
