//! Minimal `{{key}}` template substitution.
//!
//! Only bound keys are replaced. Unknown placeholders stay in the text,
//! which is what lets a partially-bound template be rendered again later
//! with more bindings (revision prompts re-render the same template with
//! the field under repair rebound).

use crate::bindings::{text_of, Bindings};

/// Replace every `{{key}}` whose `key` is present in `bindings`.
pub fn fill(template: &str, bindings: &Bindings) -> String {
    let mut out = template.to_string();
    for (key, value) in bindings {
        let placeholder = format!("{{{{{key}}}}}");
        if out.contains(&placeholder) {
            out = out.replace(&placeholder, &text_of(value));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bind(pairs: &[(&str, serde_json::Value)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_fill_all_keys() {
        let b = bind(&[("name", json!("Bob")), ("place", json!("Boston"))]);
        assert_eq!(
            fill("Hello {{name}} from {{place}}!", &b),
            "Hello Bob from Boston!"
        );
    }

    #[test]
    fn test_unknown_keys_left_untouched() {
        let b = bind(&[("a", json!("x"))]);
        assert_eq!(fill("Hi {{a}} {{b}}", &b), "Hi x {{b}}");
    }

    #[test]
    fn test_missing_key_in_sentence() {
        let b = bind(&[("name", json!("Bob"))]);
        assert_eq!(
            fill("Hello {{name}}! How is {{location}}?", &b),
            "Hello Bob! How is {{location}}?"
        );
    }

    #[test]
    fn test_empty_value() {
        let b = bind(&[("a", json!(""))]);
        assert_eq!(fill("[{{a}}]", &b), "[]");
    }

    #[test]
    fn test_numeric_value() {
        let b = bind(&[("n", json!(42))]);
        assert_eq!(fill("n = {{n}}", &b), "n = 42");
    }

    #[test]
    fn test_repeated_placeholder() {
        let b = bind(&[("x", json!("y"))]);
        assert_eq!(fill("{{x}} and {{x}}", &b), "y and y");
    }

    #[test]
    fn test_extra_bindings_ignored() {
        let b = bind(&[("a", json!("1")), ("unused", json!("2"))]);
        assert_eq!(fill("{{a}}", &b), "1");
    }
}
