//! JSON Schema validation for prompt declarations.
//!
//! Declarations are validated against schemas/prompt.schema.json before
//! any typed construction happens, so field and evaluation records are
//! structurally sound by the time the builders see them.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded prompt schema (loaded at compile time).
const PROMPT_SCHEMA_JSON: &str = include_str!("../../../../schemas/prompt.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema loading.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

/// Get or initialize the compiled schema validator.
fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(PROMPT_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a prompt declaration against the schema.
///
/// Returns `Ok(())` if valid, or the list of validation error messages.
pub fn validate_prompt_schema(declaration: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(declaration)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check a declaration against the schema without collecting messages.
pub fn is_valid_prompt(declaration: &serde_json::Value) -> bool {
    get_validator()
        .map(|v| v.is_valid(declaration))
        .unwrap_or(false)
}
