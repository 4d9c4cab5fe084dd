//! # promptloop-core
//!
//! Deterministic prompt assembly and evaluation engine.
//!
//! This crate holds everything about structured prompting that does not
//! require a model: declaring input and output fields, rendering them
//! into a prompt string, parsing tag-delimited responses back into field
//! values, and checking those values against a library of evaluations.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: rendering, parsing and every non-judged
//!    evaluation are pure functions of their inputs
//! 2. **No LLM calls**: the model-judged evaluation kind is declared
//!    here but executed by `promptloop-runtime`
//! 3. **Validated up front**: declarations are schema-checked and built
//!    into typed graphs before anything runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use promptloop_core::{Bindings, PromptConfig};
//!
//! let prompt = PromptConfig::from_yaml_file("haiku.yaml")?.build()?;
//! let mut bindings = Bindings::new();
//! bindings.insert("topic".into(), "autumn rain".into());
//! println!("{}", prompt.render_with(&bindings));
//! ```

pub mod bindings;
pub mod config;
pub mod evals;
pub mod fields;
pub mod prompt;
pub mod prompts;
pub mod tags;
pub mod template;

// Re-export main types at crate root
pub use bindings::{binding_terms, binding_text, text_of, Bindings};
pub use config::{ConfigError, FieldConfig, OutputConfig, PromptConfig};
pub use evals::{
    build_evaluation, partition_evaluations, EvalConfig, EvalConfigError, EvalResult, EvalStatus,
    Evaluation, LlmJudged,
};
pub use fields::{Field, OutputField};
pub use prompt::{Prompt, PromptError};
pub use tags::{parse_blocks, parse_one_tag, parse_tag, TagBlock};
pub use template::fill;
