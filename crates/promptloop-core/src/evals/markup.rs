//! Markup checks: required tag blocks, slash constructions, bracket
//! placeholders.

use lazy_static::lazy_static;
use regex::Regex;

use crate::bindings::{binding_text, Bindings};
use crate::evals::EvalResult;
use crate::tags::parse_blocks;

lazy_static! {
    /// Matches `word/word` constructions such as `and/or`.
    static ref SLASH_PATTERN: Regex = Regex::new(r"\b\w+/\w+\b").unwrap();

    /// Matches square-bracketed segments such as `[placeholder]`.
    static ref BRACKET_PATTERN: Regex = Regex::new(r"\[.*?\]").unwrap();
}

/// The field must contain at least one tag block for every required tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainsXml {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
    pub tags: Vec<String>,
}

impl ContainsXml {
    pub fn new(field: impl Into<String>, tags: Vec<String>) -> Self {
        let requirement = format!(
            "Must contain the following XML blocks: {}",
            tags.iter()
                .map(|tag| format!("<{tag}>"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self {
            field: field.into(),
            requirement,
            hidden: false,
            tags,
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let text = binding_text(bindings, &self.field);
        let present: Vec<String> = parse_blocks(&text)
            .into_iter()
            .map(|block| block.tag)
            .collect();
        let missing: Vec<String> = self
            .tags
            .iter()
            .filter(|tag| !present.iter().any(|p| p == *tag))
            .map(|tag| format!("<{tag}>"))
            .collect();
        if missing.is_empty() {
            EvalResult::pass(&self.field, &self.requirement)
        } else {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!(
                    "The following required XML blocks are missing: {}",
                    missing.join(", ")
                ),
            )
        }
    }
}

/// The field must not contain `word/word` slash constructions.
#[derive(Debug, Clone, PartialEq)]
pub struct NoSlashes {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
}

impl NoSlashes {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            requirement: "Does not contain any slash/constructions".into(),
            hidden: false,
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let text = binding_text(bindings, &self.field);
        let matches: Vec<&str> = SLASH_PATTERN.find_iter(&text).map(|m| m.as_str()).collect();
        if matches.is_empty() {
            EvalResult::pass(&self.field, &self.requirement)
        } else {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!(
                    "`{}` should not contain slash constructions: {}",
                    self.field,
                    matches.join(", ")
                ),
            )
        }
    }
}

/// The field must not contain square-bracketed segments.
#[derive(Debug, Clone, PartialEq)]
pub struct NoSquareBrackets {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
}

impl NoSquareBrackets {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            requirement: "Does not contain square bracket [placeholders]".into(),
            hidden: false,
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let text = binding_text(bindings, &self.field);
        let matches: Vec<&str> = BRACKET_PATTERN
            .find_iter(&text)
            .map(|m| m.as_str())
            .collect();
        if matches.is_empty() {
            EvalResult::pass(&self.field, &self.requirement)
        } else {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!("Should not contain square brackets: {}", matches.join(", ")),
            )
        }
    }
}
