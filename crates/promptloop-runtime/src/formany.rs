//! The evaluate-revise controller for many-valued prompts.
//!
//! A many-valued prompt declares one output field and expects the model
//! to emit any number of tagged blocks for it. Elements are evaluated,
//! revised and discarded independently; the outer inputs stay fixed
//! while each element takes its turn as the field's value.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use promptloop_core::{parse_one_tag, parse_tag, prompts, Bindings, EvalResult, Field, OutputField, Prompt};

use crate::providers::{CompletionConfig, LlmProvider};
use crate::runner::{evaluate_field, EvaluateOptions, ReviseOptions};
use crate::session::{ChatSession, RetryPolicy, Tokens};

/// Drives one many-valued prompt against a provider.
pub struct PromptRunnerForMany {
    task: String,
    details: String,
    inputs: Vec<Field>,
    output: OutputField,
    footer: Option<String>,
    use_cot: bool,
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    retry: RetryPolicy,
    session: ChatSession,
}

impl PromptRunnerForMany {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        task: impl Into<String>,
        output: OutputField,
    ) -> Self {
        let completion = CompletionConfig::default();
        let retry = RetryPolicy::default();
        let session = ChatSession::new(Arc::clone(&provider), completion.clone())
            .with_retry_policy(retry.clone());
        Self {
            task: task.into(),
            details: String::new(),
            inputs: Vec::new(),
            output,
            footer: None,
            use_cot: true,
            provider,
            completion,
            retry,
            session,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Inputs for the outer prompt. When unset the output field's own
    /// declared inputs are used.
    pub fn with_inputs(mut self, inputs: Vec<Field>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Whether the prompt asks for a chain-of-thought block first.
    pub fn with_cot(mut self, use_cot: bool) -> Self {
        self.use_cot = use_cot;
        self
    }

    pub fn with_completion(mut self, completion: CompletionConfig) -> Self {
        self.completion = completion;
        self.rebuild_session();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self.rebuild_session();
        self
    }

    // Builders run before the first send, so the rebuilt session starts
    // from a zero counter.
    fn rebuild_session(&mut self) {
        self.session = ChatSession::new(Arc::clone(&self.provider), self.completion.clone())
            .with_retry_policy(self.retry.clone());
    }

    fn sub_session(&self) -> ChatSession {
        ChatSession::new(Arc::clone(&self.provider), self.completion.clone())
            .with_retry_policy(self.retry.clone())
    }

    /// Combined usage of every call made so far, judges and revisions
    /// included.
    pub fn tokens(&self) -> &Tokens {
        self.session.tokens()
    }

    /// The assembled many-valued prompt.
    pub fn prompt(&self) -> Prompt {
        let mut outputs = Vec::new();
        if self.use_cot {
            outputs.push(OutputField::new(prompts::COT_NAME, prompts::COT_DESCRIPTION));
        }
        outputs.push(self.output.clone());
        let footer = self.footer.clone().unwrap_or_else(|| self.derived_footer());
        Prompt::new(self.task.clone())
            .with_details(self.details.clone())
            .with_inputs(self.declared_inputs().to_vec())
            .with_outputs(outputs)
            .with_outputs_header(prompts::OUTPUTS_HEADER_FOR_MANY)
            .with_footer(footer)
    }

    // Two example blocks and a trailing ellipsis tell the model the tag
    // repeats.
    fn derived_footer(&self) -> String {
        let example = format!("{}...{}", self.output.xml_open(), self.output.xml_close());
        let mut lines = vec![prompts::FOOTER_MANY_OUTPUTS.to_string()];
        if self.use_cot {
            lines.push(format!("<{0}>...</{0}>", prompts::COT_NAME));
        }
        lines.push(example.clone());
        lines.push(example);
        lines.push("...".to_string());
        lines.join("\n")
    }

    fn declared_inputs(&self) -> &[Field] {
        if self.inputs.is_empty() {
            &self.output.inputs
        } else {
            &self.inputs
        }
    }

    // Outer bindings are filtered to the declared inputs so stray
    // record keys never leak into an element's evaluation.
    fn element_bindings(&self, bindings: &Bindings, element: &str) -> Bindings {
        let declared: Vec<&str> = self
            .declared_inputs()
            .iter()
            .map(|field| field.name.as_str())
            .collect();
        let mut scoped: Bindings = bindings
            .iter()
            .filter(|(name, _)| declared.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        scoped.insert(
            self.output.name.clone(),
            Value::String(element.to_string()),
        );
        scoped
    }

    /// Render the prompt with `bindings`, send it, and parse every
    /// occurrence of the output tag, in order.
    ///
    /// A transport failure after retries is not fatal: the reply is
    /// treated as empty and no elements come back.
    pub async fn generate(&mut self, bindings: &Bindings) -> Vec<String> {
        self.session.clear();
        let rendered = self.prompt().render_with(bindings);
        let reply = match self.session.send(&rendered).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(%error, "Generation call failed, parsing an empty reply");
                String::new()
            }
        };
        parse_tag(&reply, &self.output.name)
            .iter()
            .map(|value| value.trim().to_string())
            .collect()
    }

    /// Evaluate each element independently. Judge usage lands on this
    /// runner's counter.
    pub async fn evaluate_all(
        &mut self,
        bindings: &Bindings,
        elements: &[String],
        options: &EvaluateOptions,
    ) -> Vec<Vec<EvalResult>> {
        let mut reports = Vec::with_capacity(elements.len());
        for element in elements {
            let scoped = self.element_bindings(bindings, element);
            let outcome = evaluate_field(
                &self.provider,
                &self.completion,
                &self.retry,
                &self.output.evaluations,
                &scoped,
                options,
            )
            .await;
            self.session.merge_tokens(&outcome.tokens);
            reports.push(outcome.failures);
        }
        reports
    }

    /// Revise each element until it passes or the budget is spent.
    /// Elements that already pass are returned untouched.
    pub async fn revise_all(
        &mut self,
        bindings: &Bindings,
        elements: &[String],
        options: &ReviseOptions,
    ) -> Vec<String> {
        let mut revised = Vec::with_capacity(elements.len());
        for element in elements {
            revised.push(self.revise_element(bindings, element, options).await);
        }
        revised
    }

    async fn revise_element(
        &mut self,
        bindings: &Bindings,
        element: &str,
        options: &ReviseOptions,
    ) -> String {
        let evaluate_options = EvaluateOptions {
            break_after_first_fail: true,
            deterministic_only: options.deterministic_only,
        };
        let mut current = element.to_string();
        for round in 1..=options.max_revisions {
            let scoped = self.element_bindings(bindings, &current);
            let outcome = evaluate_field(
                &self.provider,
                &self.completion,
                &self.retry,
                &self.output.evaluations,
                &scoped,
                &evaluate_options,
            )
            .await;
            self.session.merge_tokens(&outcome.tokens);
            let Some(failure) = outcome.failures.first() else {
                break;
            };
            info!("Revision {}: `{}`", round, self.output.name);
            debug!(?failure, "Revising for failing check");

            let revision = self.prompt().revision_prompt(&self.output);
            let mut seeded = scoped;
            seeded.insert(
                "evaluation_result".to_string(),
                Value::String(serde_json::to_string_pretty(failure).unwrap_or_default()),
            );

            let mut session = self.sub_session();
            let reply = match session.send(&revision.render_with(&seeded)).await {
                Ok(reply) => reply,
                Err(error) => {
                    warn!(field = %self.output.name, %error, "Revision call failed, keeping the current value");
                    String::new()
                }
            };
            self.session.merge_tokens(session.tokens());

            let value = parse_one_tag(&reply, &self.output.name).trim().to_string();
            if value.is_empty() {
                debug!(field = %self.output.name, "Ignoring empty revision");
            } else {
                current = value;
            }
        }
        current
    }

    /// Keep only elements that pass every check.
    pub async fn discard(&mut self, bindings: &Bindings, elements: &[String]) -> Vec<String> {
        let options = EvaluateOptions {
            break_after_first_fail: true,
            ..Default::default()
        };
        let reports = self.evaluate_all(bindings, elements, &options).await;
        elements
            .iter()
            .zip(reports)
            .filter(|(_, failures)| failures.is_empty())
            .map(|(element, _)| element.clone())
            .collect()
    }
}
