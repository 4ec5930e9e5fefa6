//! JSON Schema shape check for produced flow documents.
//!
//! The schema is embedded at compile time from `schemas/flow-document.json`
//! and checked with JSON Schema Draft 7. Only converter *output* is checked;
//! QSF input is read leniently and never validated against a schema.
//!
//! # Example
//!
//! ```rust,ignore
//! use qsf_flow::validation::validate_flow;
//!
//! let value = serde_json::to_value(&result.flow)?;
//! validate_flow(&value)?;
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::ValidationError;
use crate::models::FlowDocument;

static FLOW_SCHEMA: Lazy<Result<Value, String>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/flow-document.json"))
        .map_err(|e| format!("Invalid embedded schema: {}", e))
});

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
///
/// # Example
/// ```ignore
/// use serde_json::json;
/// use qsf_flow::validation::validate;
///
/// let schema = json!({
///     "type": "object",
///     "required": ["name"],
///     "properties": {
///         "name": { "type": "string" }
///     }
/// });
///
/// assert!(validate(&schema, &json!({ "name": "NPS" })).is_ok());
/// assert!(validate(&schema, &json!({ "id": 42 })).is_err());
/// ```
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Boolean form of [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Check a serialized flow document against the embedded flow schema.
pub fn validate_flow(data: &Value) -> Result<(), ValidationError> {
    let schema = FLOW_SCHEMA.as_ref().map_err(|e| ValidationError::Schema {
        errors: vec![e.clone()],
    })?;
    validate(schema, data).map_err(|errors| ValidationError::Schema { errors })
}

/// Quick check against the flow schema.
pub fn is_valid_flow(data: &Value) -> bool {
    match FLOW_SCHEMA.as_ref() {
        Ok(schema) => is_valid(schema, data),
        Err(_) => false,
    }
}

/// Serialize and check a typed flow document.
pub fn validate_flow_document(flow: &FlowDocument) -> Result<(), ValidationError> {
    let value = serde_json::to_value(flow).map_err(|e| ValidationError::Schema {
        errors: vec![format!("Cannot serialize flow: {}", e)],
    })?;
    validate_flow(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LanguageCatalog, SurveyDocument};
    use crate::transform::mapper::{map_survey, FlowOptions};
    use serde_json::json;

    fn sample_flow() -> Value {
        let survey = SurveyDocument::from_json(include_str!("../../fixtures/sample-survey.qsf")).unwrap();
        let catalog = LanguageCatalog::from_pairs([("EN", 1)]);
        let result = map_survey(&survey, &catalog, &FlowOptions::for_survey(&survey)).unwrap();
        serde_json::to_value(&result.flow).unwrap()
    }

    #[test]
    fn test_embedded_schema_loads() {
        let schema = FLOW_SCHEMA.as_ref().unwrap();
        assert!(schema.get("definitions").is_some());
    }

    #[test]
    fn test_converted_flow_is_valid() {
        let flow = sample_flow();
        assert!(validate_flow(&flow).is_ok(), "{:?}", validate_flow(&flow));
        assert!(is_valid_flow(&flow));
    }

    #[test]
    fn test_typed_document() {
        let mut flow = crate::models::FlowDocument::new("Only submit");
        flow.states[0].elements.push(crate::models::FlowElement::submit(
            crate::models::LocalizedText::single("EN", "Submit"),
            crate::models::flow::element_key(1),
        ));
        assert!(validate_flow_document(&flow).is_ok());
    }

    #[test]
    fn test_bad_element_key_is_reported() {
        let mut flow = sample_flow();
        flow["states"][0]["elements"][0]["key"] = json!("Q1");
        let err = validate_flow(&flow).unwrap_err();
        let ValidationError::Schema { errors } = err;
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_radio_without_options_fails() {
        let mut flow = sample_flow();
        let elements = flow["states"][0]["elements"].as_array_mut().unwrap();
        let radio = elements
            .iter_mut()
            .find(|e| e["detail"]["style"] == "radio")
            .unwrap();
        radio["detail"].as_object_mut().unwrap().remove("options");
        assert!(!is_valid_flow(&flow));
    }

    #[test]
    fn test_blank_name_fails() {
        let mut flow = sample_flow();
        flow["name"] = json!("   ");
        assert!(!is_valid_flow(&flow));
    }

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "name": "x" })).is_ok());
        assert!(!is_valid(&schema, &json!({ "name": 3 })));
    }
}
