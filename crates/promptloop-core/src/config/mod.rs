//! Prompt declarations.
//!
//! Prompts can be declared as YAML or JSON records. Loading is staged:
//! parse into a JSON value, validate against the embedded schema, then
//! deserialize into the typed records here and build the fully-typed
//! [`Prompt`] graph. By the time a [`Prompt`] exists, every field and
//! evaluation in it has been constructed and checked; nothing is upgraded
//! lazily at execution time.

mod schema;

pub use schema::{is_valid_prompt, validate_prompt_schema, SchemaError};

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evals::{build_evaluation, EvalConfig, EvalConfigError};
use crate::fields::{Field, OutputField};
use crate::prompt::{Prompt, PromptError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("declaration does not match schema: {}", .0.join("; "))]
    Schema(Vec<String>),
    #[error(transparent)]
    Evaluation(#[from] EvalConfigError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// One input field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    pub description: String,
}

impl FieldConfig {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn to_field(&self) -> Field {
        Field::new(&self.name, &self.description)
    }
}

/// One output field declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<FieldConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evaluations: Vec<EvalConfig>,
}

impl OutputConfig {
    fn build(&self) -> Result<OutputField, ConfigError> {
        let evaluations = self
            .evaluations
            .iter()
            .map(|config| build_evaluation(&self.name, &self.description, config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OutputField::new(&self.name, &self.description)
            .with_inputs(self.inputs.iter().map(FieldConfig::to_field).collect())
            .with_evaluations(evaluations))
    }
}

/// A whole prompt declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub task: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,
    /// System message for the chat session running this prompt.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub system_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<FieldConfig>,
    pub outputs: Vec<OutputConfig>,
}

impl PromptConfig {
    /// Parse a YAML declaration, validating against the schema first.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_yaml::from_str(text)?;
        Self::from_value(value)
    }

    /// Parse a JSON declaration, validating against the schema first.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Load a YAML declaration from a file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(
            path = %path.display(),
            outputs = config.outputs.len(),
            "Loaded prompt declaration"
        );
        Ok(config)
    }

    fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        validate_prompt_schema(&value).map_err(ConfigError::Schema)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Build the typed prompt this declaration describes.
    pub fn build(&self) -> Result<Prompt, ConfigError> {
        let outputs = self
            .outputs
            .iter()
            .map(OutputConfig::build)
            .collect::<Result<Vec<_>, _>>()?;
        let mut prompt = Prompt::new(&self.task)
            .with_details(&self.details)
            .with_inputs(self.inputs.iter().map(FieldConfig::to_field).collect())
            .with_outputs(outputs);
        if let Some(header) = &self.inputs_header {
            prompt = prompt.with_inputs_header(header);
        }
        if let Some(header) = &self.outputs_header {
            prompt = prompt.with_outputs_header(header);
        }
        if let Some(footer) = &self.footer {
            prompt = prompt.with_footer(footer);
        }
        prompt.validate()?;
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAIKU_YAML: &str = "\
task: Write a haiku about a given topic.
details: Use seasonal imagery where possible.
outputs:
  - name: poem
    description: A haiku about the topic
    inputs:
      - name: topic
        description: A topic for the poem
    evaluations:
      - type: max_words
        value: 17
      - type: no_square_brackets
  - name: title
    description: A title for the poem
    inputs:
      - name: topic
        description: A topic for the poem
    evaluations:
      - type: max_chars
        value: 50
";

    #[test]
    fn test_yaml_builds_prompt() {
        let config = PromptConfig::from_yaml(HAIKU_YAML).unwrap();
        let prompt = config.build().unwrap();
        assert_eq!(prompt.output_names(), vec!["poem", "title"]);
        let rendered = prompt.render();
        assert!(rendered.contains("- topic: A topic for the poem"));
        assert!(rendered.contains("- Has at most 17 words"));
        assert!(rendered.contains("Use seasonal imagery where possible."));
    }

    #[test]
    fn test_inferred_inputs_deduplicate() {
        let config = PromptConfig::from_yaml(HAIKU_YAML).unwrap();
        let prompt = config.build().unwrap();
        assert_eq!(prompt.effective_inputs().len(), 1);
    }

    #[test]
    fn test_json_declaration() {
        let text = r#"{
            "task": "Name a color.",
            "outputs": [{"name": "color", "description": "A color name"}]
        }"#;
        let prompt = PromptConfig::from_json(text).unwrap().build().unwrap();
        assert_eq!(prompt.output_names(), vec!["color"]);
    }

    #[test]
    fn test_schema_violation_is_reported() {
        let err = PromptConfig::from_yaml("task: no outputs here\n").unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)));
    }

    #[test]
    fn test_unknown_evaluation_kind_fails_build() {
        let text = "\
outputs:
  - name: a
    description: d
    evaluations:
      - type: sentiment
";
        let config = PromptConfig::from_yaml(text).unwrap();
        let err = config.build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Evaluation(EvalConfigError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_duplicate_names_fail_build() {
        let text = "\
inputs:
  - name: x
    description: d
outputs:
  - name: x
    description: d
";
        let err = PromptConfig::from_yaml(text).unwrap().build().unwrap_err();
        assert!(matches!(err, ConfigError::Prompt(PromptError::DuplicateField(_))));
    }

    #[test]
    fn test_header_overrides_apply() {
        let text = "\
inputs_header: 'Inputs:'
footer: Answer now.
outputs:
  - name: a
    description: d
";
        let prompt = PromptConfig::from_yaml(text).unwrap().build().unwrap();
        assert_eq!(prompt.inputs_header, "Inputs:");
        assert_eq!(prompt.footer_text(), "Answer now.");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PromptConfig::from_yaml_file("/nonexistent/prompt.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_system_prompt_carried() {
        let text = "\
system_prompt: You are a poet.
outputs:
  - name: a
    description: d
";
        let config = PromptConfig::from_yaml(text).unwrap();
        assert_eq!(config.system_prompt, "You are a poet.");
    }
}
