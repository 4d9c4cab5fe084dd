//! The evaluation library.
//!
//! Every check an output field can declare lives here, one small module per
//! family. Deterministic checks are pure functions of the current binding
//! set and run without any model involvement; the one model-judged kind
//! ([`LlmJudged`]) is declared here but executed by the runtime, since it
//! costs an extra round trip.
//!
//! A failing result is data, not an error: FAIL is the signal that drives
//! the revision loop.

mod containment;
mod factory;
mod judged;
mod limits;
mod markup;
mod terms;

pub use containment::{ContainsAll, ContainsOne, IsInString};
pub use factory::{build_evaluation, EvalConfig, EvalConfigError};
pub use judged::{LlmJudged, REASON_FIELD, VERDICT_FIELD};
pub use limits::{MaxChars, MaxWords, NoLongWords};
pub use markup::{ContainsXml, NoSlashes, NoSquareBrackets};
pub use terms::{IsInAllowList, NoBlockedTerms, NotInBlockedList};

use serde::{Deserialize, Serialize};

use crate::bindings::Bindings;

/// PASS or FAIL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalStatus {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
}

impl std::fmt::Display for EvalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalStatus::Pass => write!(f, "PASS"),
            EvalStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// The outcome of one evaluation of one field.
///
/// Serialized form is part of the wire contract: the pretty-printed JSON of
/// a failing result seeds the revision prompt's `evaluation_result` input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub field: String,
    pub requirement: String,
    #[serde(rename = "evaluation_result")]
    pub result: EvalStatus,
    #[serde(default)]
    pub reason: String,
}

impl EvalResult {
    pub fn pass(field: impl Into<String>, requirement: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            requirement: requirement.into(),
            result: EvalStatus::Pass,
            reason: String::new(),
        }
    }

    pub fn fail(
        field: impl Into<String>,
        requirement: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            requirement: requirement.into(),
            result: EvalStatus::Fail,
            reason: reason.into(),
        }
    }

    pub fn passed(&self) -> bool {
        self.result == EvalStatus::Pass
    }
}

/// One declared check, closed over every supported kind.
///
/// Deterministic kinds answer through [`Evaluation::evaluate`]; the
/// model-judged kind returns `None` there and is run by the runtime, which
/// owns the LLM boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    MaxChars(MaxChars),
    MaxWords(MaxWords),
    NoBlockedTerms(NoBlockedTerms),
    NotInBlockedList(NotInBlockedList),
    IsInAllowList(IsInAllowList),
    NoLongWords(NoLongWords),
    ContainsAll(ContainsAll),
    ContainsOne(ContainsOne),
    ContainsXml(ContainsXml),
    IsInString(IsInString),
    NoSlashes(NoSlashes),
    NoSquareBrackets(NoSquareBrackets),
    LlmJudged(LlmJudged),
}

impl Evaluation {
    /// The output field this check applies to.
    pub fn field(&self) -> &str {
        match self {
            Evaluation::MaxChars(e) => &e.field,
            Evaluation::MaxWords(e) => &e.field,
            Evaluation::NoBlockedTerms(e) => &e.field,
            Evaluation::NotInBlockedList(e) => &e.field,
            Evaluation::IsInAllowList(e) => &e.field,
            Evaluation::NoLongWords(e) => &e.field,
            Evaluation::ContainsAll(e) => &e.field,
            Evaluation::ContainsOne(e) => &e.field,
            Evaluation::ContainsXml(e) => &e.field,
            Evaluation::IsInString(e) => &e.field,
            Evaluation::NoSlashes(e) => &e.field,
            Evaluation::NoSquareBrackets(e) => &e.field,
            Evaluation::LlmJudged(e) => &e.field,
        }
    }

    /// The human-readable requirement line advertised in prompts.
    pub fn requirement(&self) -> &str {
        match self {
            Evaluation::MaxChars(e) => &e.requirement,
            Evaluation::MaxWords(e) => &e.requirement,
            Evaluation::NoBlockedTerms(e) => &e.requirement,
            Evaluation::NotInBlockedList(e) => &e.requirement,
            Evaluation::IsInAllowList(e) => &e.requirement,
            Evaluation::NoLongWords(e) => &e.requirement,
            Evaluation::ContainsAll(e) => &e.requirement,
            Evaluation::ContainsOne(e) => &e.requirement,
            Evaluation::ContainsXml(e) => &e.requirement,
            Evaluation::IsInString(e) => &e.requirement,
            Evaluation::NoSlashes(e) => &e.requirement,
            Evaluation::NoSquareBrackets(e) => &e.requirement,
            Evaluation::LlmJudged(e) => &e.requirement,
        }
    }

    /// Hidden checks still run but are omitted from rendered prompts.
    pub fn is_hidden(&self) -> bool {
        match self {
            Evaluation::MaxChars(e) => e.hidden,
            Evaluation::MaxWords(e) => e.hidden,
            Evaluation::NoBlockedTerms(e) => e.hidden,
            Evaluation::NotInBlockedList(e) => e.hidden,
            Evaluation::IsInAllowList(e) => e.hidden,
            Evaluation::NoLongWords(e) => e.hidden,
            Evaluation::ContainsAll(e) => e.hidden,
            Evaluation::ContainsOne(e) => e.hidden,
            Evaluation::ContainsXml(e) => e.hidden,
            Evaluation::IsInString(e) => e.hidden,
            Evaluation::NoSlashes(e) => e.hidden,
            Evaluation::NoSquareBrackets(e) => e.hidden,
            Evaluation::LlmJudged(e) => e.hidden,
        }
    }

    /// True for the model-judged kind.
    pub fn is_judged(&self) -> bool {
        matches!(self, Evaluation::LlmJudged(_))
    }

    /// Replace the advertised requirement line.
    pub fn set_requirement(&mut self, requirement: impl Into<String>) {
        let requirement = requirement.into();
        match self {
            Evaluation::MaxChars(e) => e.requirement = requirement,
            Evaluation::MaxWords(e) => e.requirement = requirement,
            Evaluation::NoBlockedTerms(e) => e.requirement = requirement,
            Evaluation::NotInBlockedList(e) => e.requirement = requirement,
            Evaluation::IsInAllowList(e) => e.requirement = requirement,
            Evaluation::NoLongWords(e) => e.requirement = requirement,
            Evaluation::ContainsAll(e) => e.requirement = requirement,
            Evaluation::ContainsOne(e) => e.requirement = requirement,
            Evaluation::ContainsXml(e) => e.requirement = requirement,
            Evaluation::IsInString(e) => e.requirement = requirement,
            Evaluation::NoSlashes(e) => e.requirement = requirement,
            Evaluation::NoSquareBrackets(e) => e.requirement = requirement,
            Evaluation::LlmJudged(e) => e.requirement = requirement,
        }
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        match self {
            Evaluation::MaxChars(e) => e.hidden = hidden,
            Evaluation::MaxWords(e) => e.hidden = hidden,
            Evaluation::NoBlockedTerms(e) => e.hidden = hidden,
            Evaluation::NotInBlockedList(e) => e.hidden = hidden,
            Evaluation::IsInAllowList(e) => e.hidden = hidden,
            Evaluation::NoLongWords(e) => e.hidden = hidden,
            Evaluation::ContainsAll(e) => e.hidden = hidden,
            Evaluation::ContainsOne(e) => e.hidden = hidden,
            Evaluation::ContainsXml(e) => e.hidden = hidden,
            Evaluation::IsInString(e) => e.hidden = hidden,
            Evaluation::NoSlashes(e) => e.hidden = hidden,
            Evaluation::NoSquareBrackets(e) => e.hidden = hidden,
            Evaluation::LlmJudged(e) => e.hidden = hidden,
        }
    }

    /// Run a deterministic check against the current bindings.
    ///
    /// Returns `None` for [`Evaluation::LlmJudged`]; judged checks need the
    /// LLM boundary and are executed by the runtime.
    pub fn evaluate(&self, bindings: &Bindings) -> Option<EvalResult> {
        match self {
            Evaluation::MaxChars(e) => Some(e.evaluate(bindings)),
            Evaluation::MaxWords(e) => Some(e.evaluate(bindings)),
            Evaluation::NoBlockedTerms(e) => Some(e.evaluate(bindings)),
            Evaluation::NotInBlockedList(e) => Some(e.evaluate(bindings)),
            Evaluation::IsInAllowList(e) => Some(e.evaluate(bindings)),
            Evaluation::NoLongWords(e) => Some(e.evaluate(bindings)),
            Evaluation::ContainsAll(e) => Some(e.evaluate(bindings)),
            Evaluation::ContainsOne(e) => Some(e.evaluate(bindings)),
            Evaluation::ContainsXml(e) => Some(e.evaluate(bindings)),
            Evaluation::IsInString(e) => Some(e.evaluate(bindings)),
            Evaluation::NoSlashes(e) => Some(e.evaluate(bindings)),
            Evaluation::NoSquareBrackets(e) => Some(e.evaluate(bindings)),
            Evaluation::LlmJudged(_) => None,
        }
    }
}

/// Split a check list into deterministic and judged groups, declaration
/// order preserved within each. Deterministic checks always run first:
/// they are free, judged checks cost a round trip.
pub fn partition_evaluations(
    evaluations: &[Evaluation],
) -> (Vec<&Evaluation>, Vec<&Evaluation>) {
    let mut deterministic = Vec::new();
    let mut judged = Vec::new();
    for evaluation in evaluations {
        if evaluation.is_judged() {
            judged.push(evaluation);
        } else {
            deterministic.push(evaluation);
        }
    }
    (deterministic, judged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_result_json_shape() {
        let result = EvalResult::fail("title", "Has at most 5 characters", "too long");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["field"], "title");
        assert_eq!(json["requirement"], "Has at most 5 characters");
        assert_eq!(json["evaluation_result"], "FAIL");
        assert_eq!(json["reason"], "too long");
    }

    #[test]
    fn test_eval_result_pass_has_empty_reason() {
        let result = EvalResult::pass("title", "req");
        assert!(result.passed());
        assert_eq!(result.reason, "");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["evaluation_result"], "PASS");
    }

    #[test]
    fn test_eval_result_round_trip() {
        let result = EvalResult::fail("f", "r", "why");
        let text = serde_json::to_string(&result).unwrap();
        let back: EvalResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_partition_keeps_declaration_order() {
        let evals = vec![
            Evaluation::LlmJudged(LlmJudged::new("f", "reads well")),
            Evaluation::MaxChars(MaxChars::new("f", 10)),
            Evaluation::MaxWords(MaxWords::new("f", 3)),
        ];
        let (deterministic, judged) = partition_evaluations(&evals);
        assert_eq!(deterministic.len(), 2);
        assert_eq!(judged.len(), 1);
        assert!(matches!(deterministic[0], Evaluation::MaxChars(_)));
        assert!(matches!(deterministic[1], Evaluation::MaxWords(_)));
    }

    #[test]
    fn test_judged_is_not_deterministic() {
        let judged = Evaluation::LlmJudged(LlmJudged::new("f", "reads well"));
        assert!(judged.is_judged());
        assert!(judged.evaluate(&Bindings::new()).is_none());
    }

    #[test]
    fn test_deterministic_purity() {
        let eval = Evaluation::MaxChars(MaxChars::new("text", 5));
        let mut bindings = Bindings::new();
        bindings.insert("text".into(), serde_json::json!("Too long"));
        let first = eval.evaluate(&bindings).unwrap();
        let second = eval.evaluate(&bindings).unwrap();
        assert_eq!(first, second);
    }
}
