use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::advisor::Advisor;
use crate::extract::extract_as;
use crate::fallback::fallback_prediction;
use crate::models::{DiseaseCandidate, Medication, PredictionVerdict, SymptomSet};
use crate::prompts::{parse_urgency, symptom_prediction_request};

/// Symptom-based prediction. Never fails: every upstream or parse problem
/// yields the keyword fallback.
pub struct PredictionPipeline {
    advisor: Option<Arc<dyn Advisor>>,
}

impl PredictionPipeline {
    pub fn new(advisor: Option<Arc<dyn Advisor>>) -> Self {
        Self { advisor }
    }

    pub async fn predict(&self, symptoms: &SymptomSet, additional_info: &str) -> PredictionVerdict {
        info!(symptoms = symptoms.len(), "Predicting from symptoms");

        let Some(advisor) = &self.advisor else {
            info!("No advisor configured, using fallback prediction");
            return fallback_prediction(symptoms);
        };

        let raw = match advisor
            .query(symptom_prediction_request(symptoms, additional_info))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Prediction request failed: {}", e);
                return fallback_prediction(symptoms);
            }
        };

        match extract_as::<RawPrediction>(&raw).and_then(RawPrediction::into_verdict) {
            Some(verdict) => {
                info!(
                    top = verdict.top_disease().map(|d| d.name.as_str()).unwrap_or("-"),
                    urgency = %verdict.urgency,
                    "Prediction complete"
                );
                verdict
            }
            None => {
                warn!("Advisor response had no usable prediction JSON, using fallback");
                fallback_prediction(symptoms)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    #[serde(default)]
    diseases: Vec<RawDisease>,
    #[serde(default)]
    medications: Vec<RawMedication>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    urgency: Option<String>,
    #[serde(default)]
    confidence_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawDisease {
    name: String,
    #[serde(default)]
    probability: f64,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawMedication {
    name: String,
    #[serde(default)]
    dosage: String,
    #[serde(default)]
    instructions: String,
}

impl RawPrediction {
    fn into_verdict(self) -> Option<PredictionVerdict> {
        if self.diseases.is_empty() {
            return None;
        }

        Some(PredictionVerdict {
            diseases: self
                .diseases
                .into_iter()
                .map(|d| DiseaseCandidate {
                    name: d.name,
                    probability: d.probability.clamp(0.0, 100.0),
                    description: d.description,
                })
                .collect(),
            medications: self
                .medications
                .into_iter()
                .map(|m| Medication {
                    name: m.name,
                    dosage: m.dosage,
                    instructions: m.instructions,
                })
                .collect(),
            recommendations: self.recommendations,
            urgency: self.urgency.as_deref().map(parse_urgency).unwrap_or_default(),
            confidence_score: self.confidence_score.unwrap_or(0.0).clamp(0.0, 100.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Urgency;
    use crate::pipeline::testing::ScriptedAdvisor;

    fn symptoms(items: &[&str]) -> SymptomSet {
        SymptomSet::new(items.iter().copied()).unwrap()
    }

    #[tokio::test]
    async fn test_advisor_json_is_used() {
        let advisor = Arc::new(ScriptedAdvisor {
            structured: Some(
                r#"Sure! {"diseases": [
                    {"name": "Influenza", "probability": 70, "description": "Viral"},
                    {"name": "Migraine", "probability": 85, "description": "Headache disorder"}
                ],
                "medications": [{"name": "Ibuprofen", "dosage": "200mg", "instructions": "With food"}],
                "recommendations": ["Rest"],
                "urgency": "LOW",
                "confidence_score": 80}"#
                    .to_string(),
            ),
            ..Default::default()
        });

        let verdict = PredictionPipeline::new(Some(advisor.clone()))
            .predict(&symptoms(&["headache", "nausea"]), "two days")
            .await;

        assert_eq!(advisor.request_count(), 1);
        assert_eq!(verdict.diseases.len(), 2);
        assert_eq!(verdict.top_disease().unwrap().name, "Migraine");
        assert_eq!(verdict.urgency, Urgency::Low);
        assert_eq!(verdict.confidence_score, 80.0);
        assert_eq!(verdict.medications[0].dosage, "200mg");
    }

    #[tokio::test]
    async fn test_upstream_failure_uses_fallback() {
        let set = symptoms(&["chest pain"]);
        let verdict = PredictionPipeline::new(Some(Arc::new(ScriptedAdvisor::default())))
            .predict(&set, "")
            .await;
        assert_eq!(verdict, fallback_prediction(&set));
    }

    #[tokio::test]
    async fn test_missing_diseases_uses_fallback() {
        let advisor = Arc::new(ScriptedAdvisor {
            structured: Some(r#"{"diseases": [], "urgency": "high"}"#.to_string()),
            ..Default::default()
        });
        let set = symptoms(&["fever"]);
        let verdict = PredictionPipeline::new(Some(advisor)).predict(&set, "").await;
        assert_eq!(verdict, fallback_prediction(&set));
    }

    #[tokio::test]
    async fn test_no_advisor_uses_fallback() {
        let set = symptoms(&["rash"]);
        let verdict = PredictionPipeline::new(None).predict(&set, "").await;
        assert_eq!(verdict, fallback_prediction(&set));
        assert!(verdict.validate().is_ok());
    }

    #[test]
    fn test_raw_prediction_clamps_and_defaults() {
        let raw: RawPrediction = serde_json::from_str(
            r#"{"diseases": [{"name": "X", "probability": -5}], "urgency": "soon"}"#,
        )
        .unwrap();
        let verdict = raw.into_verdict().unwrap();
        assert_eq!(verdict.diseases[0].probability, 0.0);
        assert_eq!(verdict.urgency, Urgency::Medium);
        assert_eq!(verdict.confidence_score, 0.0);
        assert!(verdict.medications.is_empty());
    }
}
