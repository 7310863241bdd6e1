//! Prompt templates for the advisor, one per prompt shape.

use crate::advisor::{AdvisorRequest, TimeBudget};
use crate::models::{SymptomSet, Urgency};

/// Placeholder the narrative prompt asks for when no finding can be named.
pub const UNKNOWN_FINDING: &str = "-";

pub fn urgency_request(finding: &str) -> AdvisorRequest {
    let prompt = format!(
        "Given the medical finding '{}', what is the recommended patient urgency: low, medium, or high? \
         Reply strictly with one of these words.",
        finding
    );
    AdvisorRequest::text("Medical AI", prompt)
        .temperature(0.0)
        .max_tokens(10)
        .budget(TimeBudget::Short)
}

/// Reads an urgency reply; anything other than a bare level becomes `medium`.
pub fn parse_urgency(raw: &str) -> Urgency {
    Urgency::parse_strict(raw).unwrap_or_default()
}

pub fn narrative_request(predicted_label: &str, report_type: &str, notes: &str) -> AdvisorRequest {
    let prompt = format!(
        r#"You are an expert medical assistant.
Given a user description: "{notes}" and an AI model prediction: "{predicted_label}" for a {report_type} report (e.g., chest X-ray),
1. Infer and return the most plausible DISEASE NAME or finding for this image. Use clinical language, but be understandable to a patient.
2. If the prediction does not fit the image type, offer your best guess based on the description, or say 'Unable to determine reliably.'
3. Return ONLY the disease/finding name (e.g., 'Pneumonia', 'Tuberculosis', 'Normal Chest'), a dash ({UNKNOWN_FINDING}) if unknown, or the most relevant clinical conclusion.
Do NOT add disclaimers or extra sentences."#
    );
    AdvisorRequest::text("Medical AI assistant", prompt)
        .temperature(0.3)
        .max_tokens(30)
        .budget(TimeBudget::Short)
}

/// Trims a narrative reply, mapping an empty reply to the placeholder.
pub fn parse_narrative(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN_FINDING.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn report_analysis_request(report_type: &str, content: &str) -> AdvisorRequest {
    let prompt = format!(
        r#"You are a medical AI analyzing a {report_type} report. Analyze this text:

"""{content}"""

Return analysis in JSON:
{{
  "reportType": "name",
  "findings": [{{"category": "...", "finding": "...", "severity": "normal|abnormal", "description": "..."}}],
  "recommendations": ["...", "..."],
  "urgency": "low|medium|high",
  "summary": "...",
  "confidence": 87
}}"#
    );
    AdvisorRequest::text("Medical AI", prompt)
        .temperature(0.2)
        .max_tokens(1500)
        .budget(TimeBudget::Long)
}

pub fn symptom_prediction_request(symptoms: &SymptomSet, additional_info: &str) -> AdvisorRequest {
    let prompt = format!(
        r#"You are a medical AI assistant. Analyze the following patient symptom information carefully.

Symptoms: {symptoms}
Additional Information: {additional_info}

Please provide a detailed medical prediction including:
1. Top 3 most likely medical conditions (with probability percentages and brief descriptions)
2. Recommended over-the-counter medications (with dosages and instructions)
3. General care recommendations
4. Urgency level (low, medium, high)

Return your response as a JSON object with the following structure:

{{
  "diseases": [
    {{"name": "condition_name", "probability": 90, "description": "brief_description"}},
    {{"name": "condition_name", "probability": 75, "description": "brief_description"}},
    {{"name": "condition_name", "probability": 50, "description": "brief_description"}}
  ],
  "medications": [
    {{"name": "medication_name", "dosage": "dosage_info", "instructions": "usage_instructions"}}
  ],
  "recommendations": ["recommendation1", "recommendation2"],
  "urgency": "low|medium|high",
  "confidence_score": 87
}}"#,
        symptoms = symptoms.as_slice().join(", "),
    );
    AdvisorRequest::text(
        "You are a medical AI assistant. Provide accurate medical information \
         emphasizing consulting healthcare professionals.",
        prompt,
    )
    .temperature(0.3)
    .max_tokens(1000)
    .budget(TimeBudget::Long)
}

pub const OCR_PROMPT: &str = "You are an expert medical document OCR system. Extract ALL text from this \
    medical document image with perfect accuracy, preserving the structure, values, units and medical \
    terminology. Return ONLY the extracted text without any commentary or explanations.";
