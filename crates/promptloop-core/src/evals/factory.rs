//! Construction of evaluations from declaration records.
//!
//! Prompt declarations carry evaluations as small tagged records:
//! a `type` string naming the kind plus a handful of optional knobs.
//! [`build_evaluation`] turns one record into a typed [`Evaluation`],
//! rejecting unknown kinds and missing parameters up front so nothing
//! fails at evaluation time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::FieldConfig;
use crate::evals::{
    ContainsAll, ContainsOne, ContainsXml, Evaluation, IsInAllowList, IsInString, LlmJudged,
    MaxChars, MaxWords, NoBlockedTerms, NoLongWords, NoSlashes, NoSquareBrackets,
    NotInBlockedList,
};

/// One evaluation declaration as it appears in a prompt record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Evaluation kind, e.g. `max_chars` or `llm_judged`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Kind-specific parameter: a threshold, a term list, a target
    /// string, or the requirement text for judged evaluations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Name of a sibling field supplying the parameter at evaluation
    /// time, for kinds that accept field-sourced lists or targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,
    /// Overrides the auto-derived requirement text shown in prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Hidden evaluations are checked but not announced in the prompt.
    #[serde(default)]
    pub hidden: bool,
    /// Judged evaluations only: ask for step-by-step thinking first.
    #[serde(default = "default_true")]
    pub use_cot: bool,
    /// Judged evaluations only: drop the context fields and judge the
    /// output text alone.
    #[serde(default)]
    pub output_only: bool,
    /// Judged evaluations only: context fields shown to the judge.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<FieldConfig>,
}

fn default_true() -> bool {
    true
}

impl EvalConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: None,
            value_field: None,
            label: None,
            hidden: false,
            use_cot: true,
            output_only: false,
            inputs: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_value_field(mut self, value_field: impl Into<String>) -> Self {
        self.value_field = Some(value_field.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalConfigError {
    #[error("unknown evaluation kind `{0}`")]
    UnknownKind(String),
    #[error("evaluation `{kind}` on field `{field}`: {message}")]
    InvalidParams {
        kind: String,
        field: String,
        message: String,
    },
}

fn invalid(kind: &str, field: &str, message: impl Into<String>) -> EvalConfigError {
    EvalConfigError::InvalidParams {
        kind: kind.into(),
        field: field.into(),
        message: message.into(),
    }
}

fn threshold(config: &EvalConfig, field: &str) -> Result<usize, EvalConfigError> {
    config
        .value
        .as_ref()
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .ok_or_else(|| invalid(&config.kind, field, "requires an integer value"))
}

fn term_list(config: &EvalConfig, field: &str) -> Result<Vec<String>, EvalConfigError> {
    match config.value.as_ref() {
        Some(Value::Array(items)) => Ok(items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(_) => Err(invalid(&config.kind, field, "requires a list of terms")),
        None => Err(invalid(&config.kind, field, "requires a list of terms")),
    }
}

fn text_value(config: &EvalConfig, field: &str) -> Result<String, EvalConfigError> {
    match config.value.as_ref() {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) | None => Err(invalid(&config.kind, field, "requires a string value")),
    }
}

/// Build the evaluation a declaration record describes, targeting the
/// named output field. `field_description` is only used by judged
/// evaluations, which show it to the judge.
pub fn build_evaluation(
    field: &str,
    field_description: &str,
    config: &EvalConfig,
) -> Result<Evaluation, EvalConfigError> {
    let mut evaluation = match config.kind.as_str() {
        "max_chars" => Evaluation::MaxChars(MaxChars::new(field, threshold(config, field)?)),
        "max_words" => Evaluation::MaxWords(MaxWords::new(field, threshold(config, field)?)),
        "no_long_words" => {
            Evaluation::NoLongWords(NoLongWords::new(field, threshold(config, field)?))
        }
        "no_blocked_terms" => {
            let eval = match (&config.value, &config.value_field) {
                (Some(_), None) => NoBlockedTerms::new(field, term_list(config, field)?),
                (None, Some(source)) => NoBlockedTerms::from_field(field, source),
                (Some(_), Some(source)) => {
                    let mut eval = NoBlockedTerms::new(field, term_list(config, field)?);
                    eval.terms_field = Some(source.clone());
                    eval
                }
                (None, None) => {
                    return Err(invalid(&config.kind, field, "requires value or value_field"))
                }
            };
            Evaluation::NoBlockedTerms(eval)
        }
        "not_in_blocked_list" => {
            let eval = match (&config.value, &config.value_field) {
                (Some(_), None) => NotInBlockedList::new(field, term_list(config, field)?),
                (None, Some(source)) => NotInBlockedList::from_field(field, source),
                (Some(_), Some(source)) => {
                    let mut eval = NotInBlockedList::new(field, term_list(config, field)?);
                    eval.blocked_field = Some(source.clone());
                    eval
                }
                (None, None) => {
                    return Err(invalid(&config.kind, field, "requires value or value_field"))
                }
            };
            Evaluation::NotInBlockedList(eval)
        }
        "is_in_allow_list" | "is_in" => {
            let eval = match (&config.value, &config.value_field) {
                (Some(_), None) => IsInAllowList::new(field, term_list(config, field)?),
                (None, Some(source)) => IsInAllowList::from_field(field, source),
                (Some(_), Some(source)) => {
                    let mut eval = IsInAllowList::new(field, term_list(config, field)?);
                    eval.allowed_field = Some(source.clone());
                    eval
                }
                (None, None) => {
                    return Err(invalid(&config.kind, field, "requires value or value_field"))
                }
            };
            Evaluation::IsInAllowList(eval)
        }
        "contains_one" => Evaluation::ContainsOne(ContainsOne::new(field, term_list(config, field)?)),
        "contains_all" => Evaluation::ContainsAll(ContainsAll::new(field, term_list(config, field)?)),
        "contains_xml" => Evaluation::ContainsXml(ContainsXml::new(field, term_list(config, field)?)),
        "is_in_string" => {
            let eval = match (&config.value, &config.value_field) {
                (Some(_), None) => IsInString::new(field, text_value(config, field)?),
                (None, Some(source)) => IsInString::from_field(field, source),
                (Some(_), Some(source)) => {
                    let mut eval = IsInString::new(field, text_value(config, field)?);
                    eval.target_field = Some(source.clone());
                    eval
                }
                (None, None) => {
                    return Err(invalid(&config.kind, field, "requires value or value_field"))
                }
            };
            Evaluation::IsInString(eval)
        }
        "no_slashes" => Evaluation::NoSlashes(NoSlashes::new(field)),
        "no_square_brackets" => Evaluation::NoSquareBrackets(NoSquareBrackets::new(field)),
        "llm_judged" | "llm" => {
            let requirement = match (&config.label, &config.value) {
                (Some(label), _) => label.clone(),
                (None, Some(_)) => text_value(config, field)?,
                (None, None) => {
                    return Err(invalid(&config.kind, field, "requires a requirement value"))
                }
            };
            let inputs = if config.output_only {
                Vec::new()
            } else {
                config.inputs.iter().map(FieldConfig::to_field).collect()
            };
            let judged = LlmJudged::new(field, requirement)
                .with_inputs(inputs)
                .with_field_description(field_description)
                .with_cot(config.use_cot);
            Evaluation::LlmJudged(judged)
        }
        other => return Err(EvalConfigError::UnknownKind(other.to_string())),
    };

    if let Some(label) = &config.label {
        evaluation.set_requirement(label.clone());
    }
    if config.hidden {
        evaluation.set_hidden(true);
    }
    Ok(evaluation)
}
