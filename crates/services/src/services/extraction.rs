//! Normalization of Gemini replies into validated extraction results.
//!
//! Two schemas are in use: the full listing schema backing the admin
//! add-car prefill, and a narrow schema backing public image search.
//! Validation failures are reported in-band as `success: false`, never as
//! an `Err` -- callers must check `success`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Field set the listing prefill reply must contain.
pub const LISTING_REQUIRED_FIELDS: [&str; 11] = [
    "make",
    "model",
    "year",
    "color",
    "price",
    "mileage",
    "bodyType",
    "fuelType",
    "transmission",
    "description",
    "confidence",
];

/// Field set the image-search reply must contain.
pub const SEARCH_REQUIRED_FIELDS: [&str; 4] = ["make", "bodyType", "color", "confidence"];

pub const LISTING_PROMPT: &str = r#"
Analyze the car image and extract the following information:
1. Make (manufacturer)
2. Model
3. Year (approximately)
4. Color
5. Body Type (SUV, Sedan, Hatchback, etc.)
6. Mileage
7. Fuel Type (your best guess)
8. Transmission type (your best guess)
9. Price (Your best guess)
10. Short Description as to be added to a car listing

Format your response as a clean JSON object with these fields:
{
    "make": "",
    "model": "",
    "year": 0000,
    "color": "",
    "price": "",
    "mileage": "",
    "bodyType": "",
    "fuelType": "",
    "transmission": "",
    "description": "",
    "confidence": 0.0
}

For confidence, provide a value between 0 and 1 representing how confident you are in your overall identification.
Only respond with the JSON object, nothing else.
"#;

pub const SEARCH_PROMPT: &str = r#"
Analyze this car image and extract the following information for a search query:
1. Make (manufacturer)
2. Body type (SUV, Sedan, Hatchback, etc.)
3. Color

Format your response as a clean JSON object with these fields:
{
    "make": "",
    "bodyType": "",
    "color": "",
    "confidence": 0.0
}

For confidence, provide a value between 0 and 1 representing how confident you are in your overall identification.
Only respond with the JSON object, nothing else.
"#;

/// Outcome of normalizing an AI reply. The extracted object is passed
/// through verbatim, confidence included.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ExtractionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Validate a raw reply against the full listing schema.
pub fn normalize_listing(raw: &str) -> ExtractionResult {
    normalize(raw, &LISTING_REQUIRED_FIELDS)
}

/// Validate a raw reply against the image-search schema.
pub fn normalize_search(raw: &str) -> ExtractionResult {
    normalize(raw, &SEARCH_REQUIRED_FIELDS)
}

fn normalize(raw: &str, required_fields: &[&str]) -> ExtractionResult {
    let cleaned = extract_json(raw);

    let value: serde_json::Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse AI response as JSON");
            return ExtractionResult::failure("Failed to parse AI response as JSON");
        }
    };

    let Some(object) = value.as_object() else {
        return ExtractionResult::failure("AI response is not a JSON object");
    };

    let missing: Vec<&str> = required_fields
        .iter()
        .filter(|field| !object.contains_key(**field))
        .copied()
        .collect();

    if !missing.is_empty() {
        return ExtractionResult::failure(format!(
            "AI response missing required fields: {}",
            missing.join(", ")
        ));
    }

    ExtractionResult::success(value)
}

/// Extract JSON from a string that might contain markdown code blocks
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    // Try to find JSON in code blocks
    if let Some(start) = text.find("```json") {
        let content_start = start + 7;
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    // Try generic code block
    if let Some(start) = text.find("```") {
        let content_start = start + 3;
        // Skip past any language identifier on the same line
        let content_start = text[content_start..]
            .find('\n')
            .map(|i| content_start + i + 1)
            .unwrap_or(content_start);
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    // Return as-is if no code block found
    text
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let input = r#"{"key": "value"}"#;
        assert_eq!(extract_json(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_extract_json_code_block() {
        let input = r#"Here's the JSON:
```json
{"key": "value"}
```"#;
        assert_eq!(extract_json(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_extract_json_generic_code_block() {
        let input = r#"```
{"key": "value"}
```"#;
        assert_eq!(extract_json(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_listing_with_all_fields_is_passed_through_verbatim() {
        let raw = json!({
            "make": "Toyota",
            "model": "Corolla",
            "year": 2019,
            "color": "Blue",
            "price": "15000",
            "mileage": "42000",
            "bodyType": "Sedan",
            "fuelType": "Petrol",
            "transmission": "Automatic",
            "description": "A tidy commuter sedan.",
            "confidence": 0.87
        });
        let result = normalize_listing(&raw.to_string());
        assert!(result.success);
        assert_eq!(result.data, Some(raw));
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_listing_missing_fields_names_them() {
        let raw = json!({
            "make": "Toyota",
            "model": "Corolla",
            "year": 2019,
            "color": "Blue",
            "price": "15000",
            "mileage": "42000",
            "transmission": "Automatic",
            "description": "A tidy commuter sedan.",
        });
        let result = normalize_listing(&raw.to_string());
        assert!(!result.success);
        assert_eq!(result.data, None);
        let error = result.error.unwrap();
        assert!(error.contains("bodyType"));
        assert!(error.contains("fuelType"));
        assert!(error.contains("confidence"));
    }

    #[test]
    fn test_search_schema_missing_body_type() {
        let raw = json!({ "make": "Honda", "color": "Red", "confidence": 0.5 });
        let result = normalize_search(&raw.to_string());
        assert!(!result.success);
        assert!(result.error.unwrap().contains("bodyType"));
    }

    #[test]
    fn test_unparsable_reply_fails_in_band() {
        let result = normalize_listing("the model refused to answer");
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Failed to parse AI response as JSON")
        );
    }

    #[test]
    fn test_non_object_reply_fails() {
        let result = normalize_search("[1, 2, 3]");
        assert!(!result.success);
    }

    #[test]
    fn test_fenced_reply_is_normalized() {
        let raw = "```json\n{\"make\": \"BMW\", \"bodyType\": \"SUV\", \"color\": \"Black\", \"confidence\": 0.9}\n```";
        let result = normalize_search(raw);
        assert!(result.success);
        assert_eq!(result.data.unwrap()["make"], "BMW");
    }
}
