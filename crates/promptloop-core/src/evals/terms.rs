//! Term checks: blocked terms, blocked values, allow lists.
//!
//! Each check can take its term list from the evaluation itself or from
//! another bound field at evaluation time, or both. Field-sourced checks
//! render the source field name as a `{{placeholder}}` in the requirement
//! so prompts can template the live list in.

use crate::bindings::{binding_terms, binding_text, Bindings};
use crate::evals::EvalResult;

/// The field must not contain any blocked term.
///
/// Single-word terms match whole whitespace-split tokens, multi-word terms
/// match as substrings. Both sides are lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct NoBlockedTerms {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
    pub terms: Vec<String>,
    pub terms_field: Option<String>,
}

impl NoBlockedTerms {
    pub fn new(field: impl Into<String>, terms: Vec<String>) -> Self {
        let requirement = format!("Does not contain any of the following: {}", terms.join(", "));
        Self {
            field: field.into(),
            requirement,
            hidden: false,
            terms,
            terms_field: None,
        }
    }

    pub fn from_field(field: impl Into<String>, terms_field: impl Into<String>) -> Self {
        let terms_field = terms_field.into();
        Self {
            field: field.into(),
            requirement: format!("Does not contain any of the following: {{{{{terms_field}}}}}"),
            hidden: false,
            terms: Vec::new(),
            terms_field: Some(terms_field),
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    fn effective_terms(&self, bindings: &Bindings) -> Vec<String> {
        let mut terms = self.terms.clone();
        if let Some(source) = &self.terms_field {
            terms.extend(binding_terms(bindings, source));
        }
        terms
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let text = binding_text(bindings, &self.field).to_lowercase();
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut matches = Vec::new();
        for term in self.effective_terms(bindings) {
            let lowered = term.to_lowercase();
            let is_multi_word = lowered.split_whitespace().count() > 1;
            let found = if is_multi_word {
                text.contains(&lowered)
            } else {
                words.iter().any(|word| *word == lowered)
            };
            if found {
                matches.push(term);
            }
        }
        if matches.is_empty() {
            EvalResult::pass(&self.field, &self.requirement)
        } else {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!("Should not contain the blocked text: {}", matches.join(", ")),
            )
        }
    }
}

/// The whole field value must not equal any blocked value.
///
/// Comparison trims surrounding whitespace and lowercases both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct NotInBlockedList {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
    pub blocked: Vec<String>,
    pub blocked_field: Option<String>,
}

impl NotInBlockedList {
    pub fn new(field: impl Into<String>, blocked: Vec<String>) -> Self {
        let requirement = format!(
            "Is not identical to any of the following blocked values: {}",
            blocked.join(", ")
        );
        Self {
            field: field.into(),
            requirement,
            hidden: false,
            blocked,
            blocked_field: None,
        }
    }

    pub fn from_field(field: impl Into<String>, blocked_field: impl Into<String>) -> Self {
        let blocked_field = blocked_field.into();
        Self {
            field: field.into(),
            requirement: format!(
                "Is not identical to any of the following blocked values: {{{{{blocked_field}}}}}"
            ),
            hidden: false,
            blocked: Vec::new(),
            blocked_field: Some(blocked_field),
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let text = binding_text(bindings, &self.field).trim().to_lowercase();
        let mut blocked = self.blocked.clone();
        if let Some(source) = &self.blocked_field {
            blocked.extend(binding_terms(bindings, source));
        }
        let is_blocked = blocked
            .iter()
            .any(|value| value.trim().to_lowercase() == text);
        if is_blocked {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!("'{text}' is one of the blocked values"),
            )
        } else {
            EvalResult::pass(&self.field, &self.requirement)
        }
    }
}

/// The whole field value must equal one of the allowed terms.
///
/// Comparison lowercases both sides but does not trim. An empty allow
/// list fails everything.
#[derive(Debug, Clone, PartialEq)]
pub struct IsInAllowList {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
    pub allowed: Vec<String>,
    pub allowed_field: Option<String>,
}

impl IsInAllowList {
    pub fn new(field: impl Into<String>, allowed: Vec<String>) -> Self {
        let requirement = format!("Must be one of the following terms: {}", allowed.join(", "));
        Self {
            field: field.into(),
            requirement,
            hidden: false,
            allowed,
            allowed_field: None,
        }
    }

    pub fn from_field(field: impl Into<String>, allowed_field: impl Into<String>) -> Self {
        let allowed_field = allowed_field.into();
        Self {
            field: field.into(),
            requirement: format!("Must be one of the following terms: {{{{{allowed_field}}}}}"),
            hidden: false,
            allowed: Vec::new(),
            allowed_field: Some(allowed_field),
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let original = binding_text(bindings, &self.field);
        let text = original.to_lowercase();
        let mut allowed = self.allowed.clone();
        if let Some(source) = &self.allowed_field {
            allowed.extend(binding_terms(bindings, source));
        }
        let is_allowed = allowed.iter().any(|term| term.to_lowercase() == text);
        if is_allowed {
            EvalResult::pass(&self.field, &self.requirement)
        } else {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!("'{original}' is not in the list of allowed terms"),
            )
        }
    }
}
