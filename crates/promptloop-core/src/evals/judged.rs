//! Model-judged evaluation.
//!
//! [`LlmJudged`] does not decide anything itself. It describes a nested
//! single-verdict prompt: the judge is shown the declared context fields,
//! the field under evaluation and the literal requirement text, and must
//! answer PASS or FAIL with an optional reason. Executing that prompt is
//! the runtime's job; this module only assembles it.

use crate::bindings::Bindings;
use crate::evals::{Evaluation, IsInAllowList};
use crate::fields::{Field, OutputField};
use crate::prompt::Prompt;
use crate::prompts;

/// Name of the judge's verdict output.
pub const VERDICT_FIELD: &str = "evaluation_result";

/// Name of the judge's reason output.
pub const REASON_FIELD: &str = "reason";

#[derive(Debug, Clone, PartialEq)]
pub struct LlmJudged {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
    /// Ask the judge to think step by step before the verdict.
    pub use_cot: bool,
    /// Context fields shown to the judge alongside the target field.
    pub inputs: Vec<Field>,
    /// Description of the target field, shown in the judge's input list.
    pub field_description: String,
}

impl LlmJudged {
    pub fn new(field: impl Into<String>, requirement: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            requirement: requirement.into(),
            hidden: false,
            use_cot: true,
            inputs: Vec::new(),
            field_description: String::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<Field>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_field_description(mut self, description: impl Into<String>) -> Self {
        self.field_description = description.into();
        self
    }

    pub fn with_cot(mut self, use_cot: bool) -> Self {
        self.use_cot = use_cot;
        self
    }

    /// The nested prompt that asks the model for a verdict.
    pub fn judge_prompt(&self) -> Prompt {
        let mut inputs = self.inputs.clone();
        inputs.push(Field::new(&self.field, &self.field_description));
        inputs.push(Field::new(
            "requirement",
            prompts::judge_requirement_description(&self.field),
        ));

        let verdict = OutputField::new(VERDICT_FIELD, prompts::judge_verdict_description(&self.field))
            .with_inputs(inputs.clone())
            .with_evaluations(vec![Evaluation::IsInAllowList(IsInAllowList::new(
                VERDICT_FIELD,
                vec!["PASS".into(), "FAIL".into()],
            ))]);
        let reason = OutputField::new(REASON_FIELD, prompts::JUDGE_REASON_DESCRIPTION);

        let mut outputs = Vec::new();
        if self.use_cot {
            outputs.push(OutputField::new(prompts::COT_NAME, prompts::COT_DESCRIPTION));
        }
        outputs.push(verdict);
        outputs.push(reason);

        Prompt::new(prompts::JUDGE_TASK)
            .with_inputs(inputs)
            .with_outputs(outputs)
            .with_inputs_header(prompts::JUDGE_INPUTS_HEADER)
    }

    /// Bindings for one judge call: the caller's current bindings with
    /// `requirement` bound to this evaluation's requirement text.
    pub fn judge_bindings(&self, bindings: &Bindings) -> Bindings {
        let mut seeded = bindings.clone();
        seeded.insert(
            "requirement".into(),
            serde_json::Value::String(self.requirement.clone()),
        );
        seeded
    }
}
