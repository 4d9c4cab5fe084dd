//! Prompt assembly.
//!
//! A [`Prompt`] declares a task, its input and output fields and a few
//! pieces of rendering configuration, and renders them into the single
//! string sent to the model. Rendering is deterministic text work; no
//! model interaction happens here.
//!
//! The rendered layout, top to bottom: task heading, input definitions,
//! task text, output definitions with their requirement bullets, details,
//! the tag-wrapped `{{name}}` placeholder for every input, and a closing
//! footer telling the model which tags to emit.

use thiserror::Error;

use crate::fields::{Field, OutputField};
use crate::prompts;
use crate::template::fill;
use crate::Bindings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("duplicate field name `{0}`")]
    DuplicateField(String),
    #[error("evaluation targets `{eval_field}` but is attached to output `{output}`")]
    MisdirectedEvaluation { eval_field: String, output: String },
}

/// A declared prompt: task, fields and rendering configuration.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub task: String,
    pub details: String,
    pub inputs: Vec<Field>,
    pub outputs: Vec<OutputField>,
    pub inputs_header: String,
    pub outputs_header: String,
    /// Explicit footer. When `None` a footer naming every output tag is
    /// derived at render time.
    pub footer: Option<String>,
}

impl Prompt {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            details: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            inputs_header: prompts::INPUTS_HEADER.into(),
            outputs_header: prompts::OUTPUTS_HEADER.into(),
            footer: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<Field>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<OutputField>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_inputs_header(mut self, header: impl Into<String>) -> Self {
        self.inputs_header = header.into();
        self
    }

    pub fn with_outputs_header(mut self, header: impl Into<String>) -> Self {
        self.outputs_header = header.into();
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// The inputs the rendered prompt will declare. Explicit inputs win;
    /// otherwise the union of every output's inputs, by name, in
    /// first-seen order.
    pub fn effective_inputs(&self) -> Vec<Field> {
        if !self.inputs.is_empty() {
            return self.inputs.clone();
        }
        let mut seen: Vec<Field> = Vec::new();
        for output in &self.outputs {
            for input in &output.inputs {
                if !seen.iter().any(|f| f.name == input.name) {
                    seen.push(input.clone());
                }
            }
        }
        seen
    }

    pub fn output_names(&self) -> Vec<String> {
        self.outputs.iter().map(|o| o.name.clone()).collect()
    }

    /// The closing instruction. Singular phrasing for one output, an
    /// "X and Y" pair for two, comma-joined for three or more.
    pub fn footer_text(&self) -> String {
        if let Some(footer) = &self.footer {
            return footer.clone();
        }
        match self.outputs.len() {
            0 => String::new(),
            1 => format!(
                "{} {}",
                prompts::FOOTER_ONE_OUTPUT,
                self.outputs[0].xml_open()
            ),
            n => {
                let tags: Vec<String> = self
                    .outputs
                    .iter()
                    .map(|o| format!("{}...{}", o.xml_open(), o.xml_close()))
                    .collect();
                let inline = if n == 2 {
                    tags.join(" and ")
                } else {
                    tags.join(", ")
                };
                format!("{} {}", prompts::FOOTER_MANY_OUTPUTS, inline)
            }
        }
    }

    /// Render the prompt template. Input values stay as `{{name}}`
    /// placeholders; use [`Prompt::render_with`] to substitute them.
    pub fn render(&self) -> String {
        let mut sections: Vec<String> = vec![prompts::TASK_HEADING.into()];
        let inputs = self.effective_inputs();

        if !inputs.is_empty() {
            sections.push(self.inputs_header.clone());
            sections.push(
                inputs
                    .iter()
                    .map(|f| format!("- {}", f.definition()))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }

        if !self.task.is_empty() {
            sections.push(self.task.clone());
        }

        sections.push(self.outputs_header.clone());
        for output in &self.outputs {
            sections.push(format!(
                "{}\n{}\n{}",
                output.xml_open(),
                output.description,
                output.xml_close()
            ));
        }
        for output in &self.outputs {
            let lines = output.requirement_lines();
            if !lines.is_empty() {
                sections.push(format!("Requirements for {}:", output.markdown()));
                sections.push(
                    lines
                        .iter()
                        .map(|line| format!("- {line}"))
                        .collect::<Vec<_>>()
                        .join("\n"),
                );
            }
        }

        if !self.details.is_empty() {
            sections.push(self.details.clone());
        }

        if !inputs.is_empty() {
            sections.push(prompts::INPUTS_HEADING.into());
            for input in &inputs {
                sections.push(input.input_template());
            }
        }

        let footer = self.footer_text();
        if !footer.is_empty() {
            sections.push(footer);
        }

        sections.join("\n\n")
    }

    /// Render and substitute bound input values. Unbound placeholders are
    /// left in place.
    pub fn render_with(&self, bindings: &Bindings) -> String {
        fill(&self.render(), bindings)
    }

    /// Check field declarations: names must be unique across inputs and
    /// outputs, and every evaluation must target the output it sits on.
    pub fn validate(&self) -> Result<(), PromptError> {
        let mut names: Vec<&str> = Vec::new();
        let inputs = self.effective_inputs();
        for name in inputs
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.outputs.iter().map(|o| o.name.as_str()))
        {
            if names.contains(&name) {
                return Err(PromptError::DuplicateField(name.to_string()));
            }
            names.push(name);
        }
        for output in &self.outputs {
            for eval in &output.evaluations {
                if eval.field() != output.name {
                    return Err(PromptError::MisdirectedEvaluation {
                        eval_field: eval.field().to_string(),
                        output: output.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Build the narrow single-field prompt used to repair one failing
    /// output. Its inputs are this prompt's inputs plus the failing field
    /// itself (seeded with its current value) plus an `evaluation_result`
    /// input carrying the serialized failure; its outputs are a
    /// chain-of-thought block and the field again.
    pub fn revision_prompt(&self, output: &OutputField) -> Prompt {
        let mut inputs = self.effective_inputs();
        inputs.push(output.to_input());
        inputs.push(Field::new(
            "evaluation_result",
            prompts::REVISION_RESULT_DESCRIPTION,
        ));
        let cot = OutputField::new(prompts::COT_NAME, prompts::COT_DESCRIPTION);
        Prompt::new(prompts::REVISION_TASK)
            .with_details(self.details.clone())
            .with_inputs(inputs)
            .with_outputs(vec![cot, output.clone()])
            .with_inputs_header(prompts::REVISION_INPUTS_HEADER)
    }
}
