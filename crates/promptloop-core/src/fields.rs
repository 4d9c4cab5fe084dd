//! Input and output field declarations.
//!
//! A [`Field`] names a value a prompt consumes. An [`OutputField`] names a
//! value the model must produce, along with the upstream fields it depends
//! on and the evaluations it must satisfy. Fields render themselves in the
//! handful of shapes the prompt assembler needs: markdown mentions, tag
//! markers, definition bullets and input templates.

use crate::evals::Evaluation;

/// A named prompt input.
///
/// `requirements` is normally empty. When an output is replayed as an
/// input (for judge and revision prompts) it carries the output's visible
/// requirement bullets so the definition tells the model what the value
/// was held to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub description: String,
    pub requirements: Vec<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            requirements: Vec::new(),
        }
    }

    /// The field name as an inline-code mention, e.g. `` `summary` ``.
    pub fn markdown(&self) -> String {
        format!("`{}`", self.name)
    }

    pub fn xml_open(&self) -> String {
        format!("<{}>", self.name)
    }

    pub fn xml_close(&self) -> String {
        format!("</{}>", self.name)
    }

    /// Definition line for the inputs section. Requirement bullets nest
    /// under the definition, indented to line up under a leading `- `.
    pub fn definition(&self) -> String {
        let mut out = format!("{}: {}", self.name, self.description);
        for requirement in &self.requirements {
            out.push_str("\n  - ");
            out.push_str(requirement);
        }
        out
    }

    /// Tag-wrapped `{{name}}` placeholder for the prompt's inputs block.
    pub fn input_template(&self) -> String {
        format!("{}\n{{{{{}}}}}\n{}", self.xml_open(), self.name, self.xml_close())
    }
}

/// A named prompt output with its dependencies and evaluations.
#[derive(Debug, Clone)]
pub struct OutputField {
    pub name: String,
    pub description: String,
    pub inputs: Vec<Field>,
    pub evaluations: Vec<Evaluation>,
}

impl OutputField {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            inputs: Vec::new(),
            evaluations: Vec::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<Field>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_evaluations(mut self, evaluations: Vec<Evaluation>) -> Self {
        self.evaluations = evaluations;
        self
    }

    pub fn markdown(&self) -> String {
        format!("`{}`", self.name)
    }

    pub fn xml_open(&self) -> String {
        format!("<{}>", self.name)
    }

    pub fn xml_close(&self) -> String {
        format!("</{}>", self.name)
    }

    /// Requirement bullets shown in the prompt. Hidden evaluations are
    /// checked but never announced.
    pub fn requirement_lines(&self) -> Vec<String> {
        self.evaluations
            .iter()
            .filter(|eval| !eval.is_hidden())
            .map(|eval| eval.requirement().to_string())
            .collect()
    }

    /// View of this output as an input for judge and revision prompts.
    pub fn to_input(&self) -> Field {
        Field {
            name: self.name.clone(),
            description: self.description.clone(),
            requirements: self.requirement_lines(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evals::{Evaluation, MaxChars, MaxWords};

    #[test]
    fn test_field_renderings() {
        let field = Field::new("summary", "A short summary");
        assert_eq!(field.markdown(), "`summary`");
        assert_eq!(field.xml_open(), "<summary>");
        assert_eq!(field.xml_close(), "</summary>");
        assert_eq!(field.definition(), "summary: A short summary");
        assert_eq!(field.input_template(), "<summary>\n{{summary}}\n</summary>");
    }

    #[test]
    fn test_field_definition_nests_requirements() {
        let field = Field {
            name: "title".into(),
            description: "A title".into(),
            requirements: vec!["Has at most 50 characters".into(), "Has at most 8 words".into()],
        };
        assert_eq!(
            field.definition(),
            "title: A title\n  - Has at most 50 characters\n  - Has at most 8 words"
        );
    }

    #[test]
    fn test_requirement_lines_skip_hidden() {
        let mut hidden = MaxWords::new("title", 8);
        hidden.hidden = true;
        let output = OutputField::new("title", "A title").with_evaluations(vec![
            Evaluation::MaxChars(MaxChars::new("title", 50)),
            Evaluation::MaxWords(hidden),
        ]);
        assert_eq!(output.requirement_lines(), vec!["Has at most 50 characters"]);
    }

    #[test]
    fn test_to_input_carries_visible_requirements() {
        let output = OutputField::new("title", "A title")
            .with_evaluations(vec![Evaluation::MaxChars(MaxChars::new("title", 50))]);
        let input = output.to_input();
        assert_eq!(input.name, "title");
        assert_eq!(input.description, "A title");
        assert_eq!(input.requirements, vec!["Has at most 50 characters"]);
    }
}
