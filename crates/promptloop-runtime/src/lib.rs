//! Runtime for declared prompts: providers, sessions and the
//! evaluate-revise controllers.
//!
//! `promptloop-core` assembles templates and runs deterministic checks
//! without ever touching a network. This crate adds everything that
//! talks to a model: the [`providers`] abstraction, [`session`] history
//! and token accounting, the [`judge`] bridge that turns a model reply
//! into a verdict, and the [`runner`] / [`formany`] controllers that
//! generate, evaluate and revise outputs until they pass.

pub mod formany;
pub mod judge;
pub mod providers;
pub mod runner;
pub mod session;

pub use formany::PromptRunnerForMany;
pub use judge::run_judged_evaluation;
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderFactory, ProviderRegistry, TokenUsage,
};
pub use runner::{EvalReport, EvaluateOptions, PromptRunner, ReviseOptions, RunnerError};
pub use session::{ChatSession, RetryPolicy, Tokens};
