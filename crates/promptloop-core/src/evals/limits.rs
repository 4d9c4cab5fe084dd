//! Length-limit checks: character count, word count, per-word length.

use crate::bindings::{binding_text, Bindings};
use crate::evals::EvalResult;

/// The field's character count must not exceed `max_chars`.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxChars {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
    pub max_chars: usize,
}

impl MaxChars {
    pub fn new(field: impl Into<String>, max_chars: usize) -> Self {
        Self {
            field: field.into(),
            requirement: format!("Has at most {max_chars} characters"),
            hidden: false,
            max_chars,
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let text = binding_text(bindings, &self.field);
        let count = text.chars().count();
        if count <= self.max_chars {
            EvalResult::pass(&self.field, &self.requirement)
        } else {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!(
                    "Should have at most {} chars, but has {}",
                    self.max_chars, count
                ),
            )
        }
    }
}

/// The field's whitespace-split word count must not exceed `max_words`.
#[derive(Debug, Clone, PartialEq)]
pub struct MaxWords {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
    pub max_words: usize,
}

impl MaxWords {
    pub fn new(field: impl Into<String>, max_words: usize) -> Self {
        Self {
            field: field.into(),
            requirement: format!("Has at most {max_words} words"),
            hidden: false,
            max_words,
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let text = binding_text(bindings, &self.field);
        let count = text.split_whitespace().count();
        if count <= self.max_words {
            EvalResult::pass(&self.field, &self.requirement)
        } else {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!(
                    "Should have at most {} words, but has {}",
                    self.max_words, count
                ),
            )
        }
    }
}

/// No single word in the field may exceed `max_chars` characters.
#[derive(Debug, Clone, PartialEq)]
pub struct NoLongWords {
    pub field: String,
    pub requirement: String,
    pub hidden: bool,
    pub max_chars: usize,
}

impl NoLongWords {
    pub fn new(field: impl Into<String>, max_chars: usize) -> Self {
        Self {
            field: field.into(),
            requirement: format!("Contains no words with more than {max_chars} characters"),
            hidden: false,
            max_chars,
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = requirement.into();
        self
    }

    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult {
        let text = binding_text(bindings, &self.field);
        let too_long: Vec<&str> = text
            .split_whitespace()
            .filter(|word| word.chars().count() > self.max_chars)
            .collect();
        if too_long.is_empty() {
            EvalResult::pass(&self.field, &self.requirement)
        } else {
            EvalResult::fail(
                &self.field,
                &self.requirement,
                format!(
                    "The following words have more than {} characters: {}",
                    self.max_chars,
                    too_long.join(", ")
                ),
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
    fn test_max_chars_pass() {
        let eval = MaxChars::new("text", 10);
        assert!(eval.evaluate(&bind("text", "short")).passed());
    }

    #[test]
    fn test_max_chars_fail_reason() {
        let eval = MaxChars::new("text", 5);
        let result = eval.evaluate(&bind("text", "Too long"));
        assert!(!result.passed());
        assert_eq!(result.reason, "Should have at most 5 chars, but has 8");
    }

    #[test]
    fn test_max_chars_requirement_default() {
        let eval = MaxChars::new("text", 50);
        assert_eq!(eval.requirement, "Has at most 50 characters");
    }

    #[test]
    fn test_max_chars_counts_characters_not_bytes() {
        let eval = MaxChars::new("text", 5);
        assert!(eval.evaluate(&bind("text", "héllo")).passed());
    }

    #[test]
    fn test_max_chars_boundary() {
        let eval = MaxChars::new("text", 5);
        assert!(eval.evaluate(&bind("text", "12345")).passed());
        assert!(!eval.evaluate(&bind("text", "123456")).passed());
    }

    #[test]
    fn test_max_words() {
        let eval = MaxWords::new("text", 3);
        assert!(eval.evaluate(&bind("text", "one two three")).passed());
        let result = eval.evaluate(&bind("text", "one two three four"));
        assert!(!result.passed());
        assert_eq!(result.reason, "Should have at most 3 words, but has 4");
    }

    #[test]
    fn test_max_words_collapses_whitespace() {
        let eval = MaxWords::new("text", 2);
        assert!(eval.evaluate(&bind("text", "  one \n two  ")).passed());
    }

    #[test]
    fn test_no_long_words() {
        let eval = NoLongWords::new("text", 9);
        assert!(eval.evaluate(&bind("text", "cat dog")).passed());
        let result = eval.evaluate(&bind("text", "A vegetarian nightingale"));
        assert!(!result.passed());
        assert_eq!(
            result.reason,
            "The following words have more than 9 characters: vegetarian, nightingale"
        );
    }

    #[test]
    fn test_missing_field_reads_empty() {
        let eval = MaxChars::new("absent", 5);
        assert!(eval.evaluate(&Bindings::new()).passed());
    }

    #[test]
    fn test_custom_requirement() {
        let eval = MaxChars::new("text", 5).with_requirement("Keep it terse");
        assert_eq!(eval.requirement, "Keep it terse");
    }
}
