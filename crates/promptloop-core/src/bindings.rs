//! The binding set: current values for prompt inputs and outputs.
//!
//! Bindings are kept as JSON values so that field-sourced evaluation
//! parameters (a sibling binding holding a term list) and plain text
//! values travel through the same map. A `BTreeMap` keeps iteration
//! deterministic.

use std::collections::BTreeMap;

use serde_json::Value;

/// Field name → current value.
pub type Bindings = BTreeMap<String, Value>;

/// Render a binding value as prompt text.
///
/// Strings render as-is, null as empty; everything else uses its JSON
/// form. Callers that need the raw JSON should read the `Value` directly.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// The text of a named binding; missing bindings read as empty.
pub fn binding_text(bindings: &Bindings, name: &str) -> String {
    bindings.get(name).map(text_of).unwrap_or_default()
}

/// A named binding interpreted as a term list.
///
/// Arrays yield one term per element (stringified); a bare string yields a
/// single term; anything else, or a missing binding, yields no terms.
pub fn binding_terms(bindings: &Bindings, name: &str) -> Vec<String> {
    match bindings.get(name) {
        Some(Value::Array(items)) => items.iter().map(text_of).collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}
