//! JSON Schema validation for quality request envelopes.
//!
//! Requests are checked against an embedded JSON Schema before they are
//! deserialized, so that a malformed envelope is rejected with field-level
//! messages instead of a bare deserialization error. The schema covers the
//! envelope only: individual rule definitions are parsed leniently later and
//! reported per record when they are broken.
//!
//! # Example
//! ```rust
//! use dataqc_core::request_schema::validate_request;
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let request = json!({
//!     "action": "validate_quality",
//!     "data": [{"firstName": "Ada"}],
//!     "threshold": 0.9
//! });
//!
//! validate_request(&request)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use jsonschema::Validator;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// Request schema validation errors with field-level reporting
#[derive(Debug, Error)]
pub enum RequestSchemaError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// Validation failed with specific field errors
    #[error("Request validation failed with {error_count} errors: {}", errors.join("; "))]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },
}

/// Embedded JSON Schema for the request envelope
const REQUEST_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "DataQC quality request",
  "type": "object",
  "required": ["action"],
  "properties": {
    "action": {
      "enum": [
        "validate_quality",
        "detect_anomalies",
        "check_completeness",
        "validate_accuracy",
        "generate_qc_report",
        "get_quality_metrics"
      ]
    },
    "data": {},
    "rules": { "type": ["array", "null"] },
    "threshold": { "type": ["number", "null"], "minimum": 0, "maximum": 1 }
  }
}"#;

/// Compiled JSON Schema instance (initialized once)
static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Initialize and compile the request JSON Schema.
///
/// Compiles the embedded schema and caches it for reuse. Calling it again
/// is harmless; [`validate_request`] also calls it on first use.
///
/// # Errors
/// Returns `RequestSchemaError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_request_validator() -> Result<(), RequestSchemaError> {
    if COMPILED_SCHEMA.get().is_some() {
        return Ok(());
    }

    let schema_json = get_schema_definition()?;
    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        RequestSchemaError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    // Another thread may have won the race; either instance is equivalent
    let _ = COMPILED_SCHEMA.set(compiled);

    Ok(())
}

/// Validate a request envelope against the JSON Schema.
///
/// Every violation is collected, not just the first.
///
/// # Errors
/// Returns `RequestSchemaError::ValidationFailed` listing each violation.
pub fn validate_request(request: &Value) -> Result<(), RequestSchemaError> {
    initialize_request_validator()?;
    let schema = COMPILED_SCHEMA
        .get()
        .ok_or_else(|| RequestSchemaError::SchemaCompilation {
            message: "Request validator not initialized".to_string(),
        })?;

    let errors: Vec<String> = schema
        .iter_errors(request)
        .map(|error| error.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(RequestSchemaError::ValidationFailed {
            error_count: errors.len(),
            errors,
        })
    }
}

/// Get the embedded JSON Schema as a parsed Value for external use.
pub fn get_schema_definition() -> Result<Value, RequestSchemaError> {
    serde_json::from_str(REQUEST_SCHEMA).map_err(|e| RequestSchemaError::SchemaCompilation {
        message: format!("Failed to parse embedded schema: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_initialization_success() {
        assert!(initialize_request_validator().is_ok());
        assert!(initialize_request_validator().is_ok());
    }

    #[test]
    fn test_valid_requests_pass() {
        for request in [
            json!({"action": "validate_quality", "data": []}),
            json!({"action": "generate_qc_report", "data": [{"a": 1}], "rules": [], "threshold": 0.5}),
            json!({"action": "detect_anomalies", "data": [], "rules": null, "threshold": null}),
            // Rule contents and data shape are checked downstream
            json!({"action": "check_completeness", "data": "not a list", "rules": [42]}),
        ] {
            assert!(validate_request(&request).is_ok(), "{} should pass", request);
        }
    }

    #[test]
    fn test_missing_or_unknown_action_fails() {
        assert!(matches!(
            validate_request(&json!({"data": []})),
            Err(RequestSchemaError::ValidationFailed { .. })
        ));
        assert!(validate_request(&json!({"action": "reticulate_splines"})).is_err());
        assert!(validate_request(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_all_violations_are_reported() {
        let result = validate_request(&json!({
            "action": "validate_quality",
            "rules": "email",
            "threshold": 1.5
        }));
        match result {
            Err(RequestSchemaError::ValidationFailed {
                error_count,
                errors,
            }) => {
                assert_eq!(error_count, 2);
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_threshold_type_is_checked() {
        assert!(validate_request(&json!({"action": "validate_quality", "threshold": "high"})).is_err());
        assert!(validate_request(&json!({"action": "validate_quality", "threshold": -0.1})).is_err());
    }

    #[test]
    fn test_schema_definition_is_exposed() {
        let schema = get_schema_definition().unwrap();
        assert_eq!(schema["required"], json!(["action"]));
    }
}
