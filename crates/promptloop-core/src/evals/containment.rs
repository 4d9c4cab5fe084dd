//! Substring containment checks.

use crate::bindings::{binding_text, Bindings};
use crate::evals::EvalResult;

/// The field must contain at least one required term as a substring.
/// Both sides are lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainsOne {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
    pub required_terms: Vec<String>,
}

impl ContainsOne {
    pub fn new(field: impl Into<String>, required_terms: Vec<String>) -> Self {
        let requirement = format!(
            "Must contain at least one of: {}",
            required_terms.join(", ")
        );
        Self {
            field: field.into(),
            requirement,
            hidden: false,
            required_terms,
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let text = binding_text(bindings, &self.field).to_lowercase();
        let found = self
            .required_terms
            .iter()
            .any(|term| text.contains(&term.to_lowercase()));
        if found {
            EvalResult::pass(&self.field, &self.requirement)
        } else {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!(
                    "Field '{}' does not contain any of the required values: {}",
                    self.field,
                    self.required_terms.join(", ")
                ),
            )
        }
    }
}

/// The field must contain every required term as a substring.
/// Both sides are lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainsAll {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
    pub required_terms: Vec<String>,
}

impl ContainsAll {
    pub fn new(field: impl Into<String>, required_terms: Vec<String>) -> Self {
        let requirement = format!("Must contain all of: {}", required_terms.join(", "));
        Self {
            field: field.into(),
            requirement,
            hidden: false,
            required_terms,
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let text = binding_text(bindings, &self.field).to_lowercase();
        let missing: Vec<&str> = self
            .required_terms
            .iter()
            .filter(|term| !text.contains(&term.to_lowercase()))
            .map(|term| term.as_str())
            .collect();
        if missing.is_empty() {
            EvalResult::pass(&self.field, &self.requirement)
        } else {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!(
                    "Field '{}' is missing required values: {}",
                    self.field,
                    missing.join(", ")
                ),
            )
        }
    }
}

/// The field value must be a substring of a target string, either fixed
/// or taken from another bound field. A bound target replaces the fixed
/// one. Both sides are lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct IsInString {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
    pub target: String,
    pub target_field: Option<String>,
}

impl IsInString {
    pub fn new(field: impl Into<String>, target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            field: field.into(),
            requirement: format!("Must be contained in: {target}"),
            hidden: false,
            target,
            target_field: None,
        }
    }

    pub fn from_field(field: impl Into<String>, target_field: impl Into<String>) -> Self {
        let target_field = target_field.into();
        Self {
            field: field.into(),
            requirement: format!("Must be contained in: {{{{{target_field}}}}}"),
            hidden: false,
            target: String::new(),
            target_field: Some(target_field),
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let original = binding_text(bindings, &self.field);
        let text = original.to_lowercase();
        let target = match &self.target_field {
            Some(source) if bindings.contains_key(source) => binding_text(bindings, source),
            _ => self.target.clone(),
        };
        if target.to_lowercase().contains(&text) {
            EvalResult::pass(&self.field, &self.requirement)
        } else {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!("'{original}' is not found in the target string"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bind(field: &str, value: &str) -> Bindings {
        let mut b = Bindings::new();
        b.insert(field.into(), json!(value));
        b
    }

    #[test]
    fn test_contains_one_pass() {
        let eval = ContainsOne::new("text", vec!["apple".into(), "pear".into()]);
        assert!(eval.evaluate(&bind("text", "I ate a pear today")).passed());
    }

    #[test]
    fn test_contains_one_fail() {
        let eval = ContainsOne::new("text", vec!["apple".into(), "pear".into()]);
        let result = eval.evaluate(&bind("text", "just grapes"));
        assert!(!result.passed());
        assert_eq!(
            result.reason,
            "Field 'text' does not contain any of the required values: apple, pear"
        );
    }

    #[test]
    fn test_contains_one_requirement() {
        let eval = ContainsOne::new("text", vec!["a".into(), "b".into()]);
        assert_eq!(eval.requirement, "Must contain at least one of: a, b");
    }

    #[test]
    fn test_contains_all_case_insensitive() {
        let eval = ContainsAll::new("text", vec!["APPLE".into(), "BaNaNa".into()]);
        let result = eval.evaluate(&bind("text", "i have an Apple and a banana"));
        assert!(result.passed());
    }

    #[test]
    fn test_contains_all_reports_missing_only() {
        let eval = ContainsAll::new("text", vec!["apple".into(), "banana".into()]);
        let result = eval.evaluate(&bind("text", "just an apple"));
        assert!(!result.passed());
        assert_eq!(result.reason, "Field 'text' is missing required values: banana");
    }

    #[test]
    fn test_contains_all_substring_match() {
        let eval = ContainsAll::new("text", vec!["app".into()]);
        assert!(eval.evaluate(&bind("text", "pineapples")).passed());
    }

    #[test]
    fn test_is_in_string_pass() {
        let eval = IsInString::new("word", "The quick brown fox");
        assert!(eval.evaluate(&bind("word", "quick")).passed());
    }

    #[test]
    fn test_is_in_string_fail_reports_original() {
        let eval = IsInString::new("word", "The quick brown fox");
        let result = eval.evaluate(&bind("word", "Slow"));
        assert!(!result.passed());
        assert_eq!(result.reason, "'Slow' is not found in the target string");
    }

    #[test]
    fn test_is_in_string_bound_target_replaces_fixed() {
        let eval = IsInString {
            target_field: Some("text".into()),
            ..IsInString::new("word", "unrelated")
        };
        let mut b = bind("word", "dog");
        b.insert("text".into(), json!("The dog barks"));
        assert!(eval.evaluate(&b).passed());
    }

    #[test]
    fn test_is_in_string_from_field_requirement() {
        let eval = IsInString::from_field("word", "text");
        assert_eq!(eval.requirement, "Must be contained in: {{text}}");
        let mut b = bind("word", "cat");
        b.insert("text".into(), json!("The dog barks"));
        assert!(!eval.evaluate(&b).passed());
    }

    #[test]
    fn test_is_in_string_case_insensitive() {
        let eval = IsInString::new("word", "ALPHA BETA");
        assert!(eval.evaluate(&bind("word", "beta")).passed());
    }
}
