//! Recovery of a JSON object from free-form generator output.
//!
//! The span runs from the first `{` to the last `}` in the text. Nested
//! objects are covered because the span is greedy, but two independent
//! objects in one response, or a stray brace in surrounding prose, produce a
//! span that fails to parse and the caller falls back.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

/// Returns the embedded JSON object, or `None` when there is no parseable span.
pub fn extract(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        debug!("closing brace precedes opening brace, no JSON span");
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            debug!("JSON span failed to parse: {}", e);
            None
        }
    }
}

/// Extracts the embedded object and deserializes it into `T`.
pub fn extract_as<T: DeserializeOwned>(text: &str) -> Option<T> {
    let object = extract(text)?;
    match serde_json::from_value(Value::Object(object)) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("embedded JSON does not match expected shape: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_extracts_object_wrapped_in_prose() {
        let text = "Sure! Here is the analysis:\n{\"urgency\": \"low\", \"confidence\": 87}\nStay safe.";
        let map = extract(text).unwrap();
        assert_eq!(map["urgency"], "low");
        assert_eq!(map["confidence"], 87);
    }

    #[test]
    fn test_extracts_from_code_fence() {
        let text = "```json\n{\n  \"diseases\": [\n    {\"name\": \"Flu\", \"probability\": 70}\n  ]\n}\n```";
        let map = extract(text).unwrap();
        assert_eq!(map["diseases"][0]["name"], "Flu");
    }

    #[test]
    fn test_round_trip_with_arbitrary_prose() {
        let object = json!({
            "reportType": "Blood Report",
            "findings": [{"category": "CBC", "finding": "Low Hb", "severity": "abnormal", "description": "x"}],
            "nested": {"deep": {"value": [1, 2, 3]}}
        });
        let embedded = format!(
            "Analysis follows.\n\n{}\n\nLet me know if you need more.",
            serde_json::to_string_pretty(&object).unwrap()
        );
        assert_eq!(Value::Object(extract(&embedded).unwrap()), object);
    }

    #[test]
    fn test_absent_without_braces() {
        assert!(extract("no json here at all").is_none());
        assert!(extract("").is_none());
        assert!(extract("only an opening { brace").is_none());
        assert!(extract("} reversed {").is_none());
    }

    #[test]
    fn test_absent_on_malformed_span() {
        assert!(extract("{\"a\": 1,}").is_none());
        assert!(extract("{\"a\": 1} and also {\"b\": 2}").is_none());
    }

    #[test]
    fn test_extract_as_typed() {
        #[derive(Deserialize)]
        struct Shape {
            urgency: String,
        }
        let shape: Shape = extract_as("result: {\"urgency\": \"high\"}").unwrap();
        assert_eq!(shape.urgency, "high");
        assert!(extract_as::<Shape>("{\"other\": 1}").is_none());
    }
}
