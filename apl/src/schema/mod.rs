//! JSON Schema validation for structured output
//!
//! Thin wrapper over the `jsonschema` crate behind the runtime's validator
//! interface: check a value, append one message per violation, report
//! overall success. Unknown schema keywords are ignored by the underlying
//! validator.

use serde_json::Value;
use tracing::debug;

/// Validate `value` against `schema`, appending failures to `errors`
///
/// A schema that itself fails to compile counts as a validation failure.
pub fn validate_schema(value: &Value, schema: &Value, errors: &mut Vec<String>) -> bool {
    let validator = match jsonschema::validator_for(schema) {
        Ok(validator) => validator,
        Err(e) => {
            errors.push(format!("Schema validation error: invalid schema: {e}"));
            return false;
        }
    };

    let before = errors.len();
    for violation in validator.iter_errors(value) {
        debug!(%violation, "schema violation");
        errors.push(format!("Schema validation error: {violation}"));
    }
    errors.len() == before
}
