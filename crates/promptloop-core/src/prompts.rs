//! Fixed prompt wording.
//!
//! Every header, footer and instruction string the assembler emits lives
//! here. Downstream code builds prompts from these constants so that the
//! exact wording the model sees is defined in one place.

/// Default header introducing the input definitions section.
pub const INPUTS_HEADER: &str = "You are provided the following inputs:";

/// Header introducing the output definitions section.
pub const OUTPUTS_HEADER: &str = "Generate the following outputs within XML tags:";

/// Outputs header used by the many-valued prompt form.
pub const OUTPUTS_HEADER_FOR_MANY: &str = "Generate the following outputs enclosed within XML tags:";

/// Heading opening every prompt.
pub const TASK_HEADING: &str = "# Task Description";

/// Footer stem used when exactly one output is requested.
pub const FOOTER_ONE_OUTPUT: &str = "Generate the required output within XML tags:";

/// Footer stem used when several outputs are requested.
pub const FOOTER_MANY_OUTPUTS: &str = "Generate the required outputs within XML tags:";

/// Heading opening the rendered input values.
pub const INPUTS_HEADING: &str = "# Inputs";

/// Name of the chain-of-thought output.
pub const COT_NAME: &str = "thinking";

/// Description of the chain-of-thought output.
pub const COT_DESCRIPTION: &str = "Begin by thinking step by step";

/// Inputs header for revision prompts.
pub const REVISION_INPUTS_HEADER: &str =
    "You will be provided a set of inputs, along with a non-passing evaluation result.";

/// Task instruction for revision prompts.
pub const REVISION_TASK: &str = "Your task is to generate an updated version of the field indicated in the evaluation result so that it meets all evaluation criteria and requirements.";

/// Description of the serialized failure handed to a revision prompt.
pub const REVISION_RESULT_DESCRIPTION: &str = "An evaluation result";

/// Inputs header for judge prompts.
pub const JUDGE_INPUTS_HEADER: &str = "You will be provided a set of inputs, along with an evaluation criteria that one of the inputs is expected to satisfy.";

/// Task instruction for judge prompts.
pub const JUDGE_TASK: &str = "Your task is to determine if the input meets the requirement.";

/// Description of the judge's `reason` output.
pub const JUDGE_REASON_DESCRIPTION: &str =
    "A reason for the evaluation result. Leave blank when the evaluation passes.";

/// Description of the judge's verdict output for a given field name.
pub fn judge_verdict_description(field: &str) -> String {
    format!("PASS if `{field}` meets the requirement described in `requirement`, FAIL otherwise")
}

/// Description of the requirement input handed to a judge prompt.
pub fn judge_requirement_description(field: &str) -> String {
    format!("A requirement for `{field}`")
}
