//! Deterministic verdicts used when the remote advisor or its output is unusable.

use crate::models::{
    DiseaseCandidate, Finding, Medication, PredictionVerdict, ReportType, Severity,
    StructuredVerdict, SymptomSet, Urgency,
};

const COLD_FLU_KEYWORDS: &[&str] = &["fever", "headache", "fatigue"];
const CARDIOPULMONARY_KEYWORDS: &[&str] = &["chest pain", "shortness of breath"];

/// Symptom-driven fallback. Keyword groups are checked in order and the first
/// match wins.
pub fn fallback_prediction(symptoms: &SymptomSet) -> PredictionVerdict {
    if symptoms.contains_any(COLD_FLU_KEYWORDS) {
        cold_flu_bundle()
    } else if symptoms.contains_any(CARDIOPULMONARY_KEYWORDS) {
        cardiopulmonary_bundle()
    } else {
        malaise_bundle()
    }
}

/// Report fallback; identical for every report type apart from the title.
pub fn fallback_report(report_type: &ReportType) -> StructuredVerdict {
    StructuredVerdict {
        report_type: format!("{} Report", report_type.title()),
        findings: vec![Finding {
            category: "General".to_string(),
            finding: "No specific abnormalities detected".to_string(),
            severity: Severity::Normal,
            description: "Fallback default analysis".to_string(),
        }],
        recommendations: vec!["Consult doctor for detailed evaluation".to_string()],
        urgency: Urgency::Low,
        summary: "Report processed, no major issues found".to_string(),
        confidence: 75.0,
    }
}

fn cold_flu_bundle() -> PredictionVerdict {
    PredictionVerdict {
        diseases: vec![
            disease("Common Cold", 87.0, "Viral upper respiratory infection"),
            disease("Influenza", 72.0, "Seasonal flu with systemic symptoms"),
            disease("COVID-19", 45.0, "Coronavirus infection"),
        ],
        medications: vec![
            medication("Acetaminophen", "500mg every 6 hours", "Take with food"),
            medication("Ibuprofen", "200mg every 8 hours", "Anti-inflammatory"),
        ],
        recommendations: strings(&[
            "Get plenty of rest and stay hydrated",
            "Monitor symptoms and seek medical attention if they worsen",
            "Avoid contact with others to prevent spread",
        ]),
        urgency: Urgency::Low,
        confidence_score: 82.0,
    }
}

fn cardiopulmonary_bundle() -> PredictionVerdict {
    PredictionVerdict {
        diseases: vec![
            disease(
                "Anxiety Disorder",
                78.0,
                "Panic attack or anxiety-related symptoms",
            ),
            disease("Asthma", 65.0, "Respiratory condition"),
            disease("Heart Condition", 35.0, "Potential cardiac issue"),
        ],
        medications: vec![
            medication(
                "Deep breathing exercises",
                "As needed",
                "Practice relaxation techniques",
            ),
            medication(
                "Antihistamine",
                "As directed",
                "If allergic reaction suspected",
            ),
        ],
        recommendations: strings(&[
            "Practice deep breathing exercises",
            "Seek immediate medical attention if symptoms persist",
            "Consider stress management techniques",
        ]),
        urgency: Urgency::Medium,
        confidence_score: 75.0,
    }
}

fn malaise_bundle() -> PredictionVerdict {
    PredictionVerdict {
        diseases: vec![
            disease("General Malaise", 60.0, "Non-specific symptoms"),
            disease("Viral Syndrome", 45.0, "Common viral infection"),
        ],
        medications: vec![
            medication("Rest and hydration", "As needed", "Support body recovery"),
            medication(
                "Over-the-counter pain relief",
                "As directed",
                "For symptom management",
            ),
        ],
        recommendations: strings(&[
            "Monitor symptoms closely",
            "Maintain good hydration",
            "Consult healthcare provider if symptoms worsen",
        ]),
        urgency: Urgency::Low,
        confidence_score: 65.0,
    }
}

fn disease(name: &str, probability: f64, description: &str) -> DiseaseCandidate {
    DiseaseCandidate {
        name: name.to_string(),
        probability,
        description: description.to_string(),
    }
}

fn medication(name: &str, dosage: &str, instructions: &str) -> Medication {
    Medication {
        name: name.to_string(),
        dosage: dosage.to_string(),
        instructions: instructions.to_string(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
