//! The evaluate-revise controller for single-valued prompts.
//!
//! [`PromptRunner`] drives one declared prompt end to end: render and
//! send the assembled template, parse one value per declared output,
//! run each output's checks, and issue corrective sub-prompts for
//! failing fields until everything passes or the revision budget is
//! spent.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use promptloop_core::{
    parse_one_tag, partition_evaluations, Bindings, EvalResult, Evaluation, OutputField, Prompt,
};

use crate::judge::run_judged_evaluation;
use crate::providers::{CompletionConfig, LlmProvider};
use crate::session::{ChatSession, RetryPolicy, Tokens};

/// Contract violations from the controller.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// A declared output never made it into the parsed output map.
    #[error("declared output `{0}` missing from parsed response")]
    MissingOutput(String),
}

/// Knobs for one evaluation pass.
#[derive(Debug, Clone, Default)]
pub struct EvaluateOptions {
    /// Stop at the first failing check per field.
    pub break_after_first_fail: bool,
    /// Skip model-judged checks entirely.
    pub deterministic_only: bool,
}

/// Knobs for the revision loop.
#[derive(Debug, Clone)]
pub struct ReviseOptions {
    /// Revision rounds allowed after the initial generation.
    pub max_revisions: usize,
    /// Skip model-judged checks entirely.
    pub deterministic_only: bool,
}

impl Default for ReviseOptions {
    fn default() -> Self {
        Self {
            max_revisions: 6,
            deterministic_only: false,
        }
    }
}

/// Evaluation failures grouped by output field.
///
/// Every declared output has an entry; fields that passed every check
/// map to an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalReport {
    failures: BTreeMap<String, Vec<EvalResult>>,
}

impl EvalReport {
    /// True when no field recorded a failure.
    pub fn passed(&self) -> bool {
        self.failures.values().all(Vec::is_empty)
    }

    /// Failures recorded for one field.
    pub fn failures_for(&self, field: &str) -> &[EvalResult] {
        self.failures.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of fields with at least one failure.
    pub fn failing_fields(&self) -> Vec<&str> {
        self.failures
            .iter()
            .filter(|(_, failures)| !failures.is_empty())
            .map(|(field, _)| field.as_str())
            .collect()
    }

    fn set(&mut self, field: String, failures: Vec<EvalResult>) {
        self.failures.insert(field, failures);
    }
}

pub(crate) struct FieldOutcome {
    pub(crate) failures: Vec<EvalResult>,
    pub(crate) tokens: Tokens,
}

/// Run one field's checks against `bindings`, deterministic checks
/// first. Judged checks go to the provider unless `deterministic_only`
/// is set; their usage is returned for the caller to merge.
pub(crate) async fn evaluate_field(
    provider: &Arc<dyn LlmProvider>,
    completion: &CompletionConfig,
    retry: &RetryPolicy,
    evaluations: &[Evaluation],
    bindings: &Bindings,
    options: &EvaluateOptions,
) -> FieldOutcome {
    let (deterministic, judged) = partition_evaluations(evaluations);
    let mut failures = Vec::new();
    let mut tokens = Tokens::default();

    for evaluation in deterministic.into_iter().chain(judged) {
        let result = match evaluation {
            Evaluation::LlmJudged(check) => {
                if options.deterministic_only {
                    continue;
                }
                let (result, usage) =
                    run_judged_evaluation(Arc::clone(provider), completion, retry, check, bindings)
                        .await;
                tokens.merge(&usage);
                result
            }
            other => match other.evaluate(bindings) {
                Some(result) => result,
                None => continue,
            },
        };
        if !result.passed() {
            failures.push(result);
            if options.break_after_first_fail {
                break;
            }
        }
    }

    FieldOutcome { failures, tokens }
}

/// Drives one declared prompt against a provider.
pub struct PromptRunner {
    prompt: Prompt,
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    retry: RetryPolicy,
    system_prompt: Option<String>,
    session: ChatSession,
}

impl PromptRunner {
    pub fn new(provider: Arc<dyn LlmProvider>, prompt: Prompt) -> Self {
        let completion = CompletionConfig::default();
        let retry = RetryPolicy::default();
        let session = ChatSession::new(Arc::clone(&provider), completion.clone())
            .with_retry_policy(retry.clone());
        Self {
            prompt,
            provider,
            completion,
            retry,
            system_prompt: None,
            session,
        }
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

    /// System message for generation calls. Empty text clears it.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        let text = system_prompt.into();
        self.system_prompt = (!text.is_empty()).then_some(text);
        self.rebuild_session();
        self
    }

    // Builders run before the first send, so the rebuilt session starts
    // from a zero counter.
    fn rebuild_session(&mut self) {
        let mut session = ChatSession::new(Arc::clone(&self.provider), self.completion.clone())
            .with_retry_policy(self.retry.clone());
        if let Some(system_prompt) = &self.system_prompt {
            session = session.with_system_prompt(system_prompt);
        }
        self.session = session;
    }

    fn sub_session(&self) -> ChatSession {
        ChatSession::new(Arc::clone(&self.provider), self.completion.clone())
            .with_retry_policy(self.retry.clone())
    }

    /// The declared prompt this runner drives.
    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Combined usage of every call made so far, judges and revisions
    /// included.
    pub fn tokens(&self) -> &Tokens {
        self.session.tokens()
    }

    /// Render the prompt with `bindings`, send it, and parse one value
    /// per declared output.
    ///
    /// The session history is cleared first so consecutive records never
    /// see each other. A transport failure after retries is not fatal:
    /// the reply is treated as empty and every output parses to the
    /// empty string.
    pub async fn generate(&mut self, bindings: &Bindings) -> Result<Bindings, RunnerError> {
        self.session.clear();
        let rendered = self.prompt.render_with(bindings);
        let reply = match self.session.send(&rendered).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(%error, "Generation call failed, parsing an empty reply");
                String::new()
            }
        };

        let mut merged = bindings.clone();
        for output in &self.prompt.outputs {
            let value = parse_one_tag(&reply, &output.name).trim().to_string();
            merged.insert(output.name.clone(), Value::String(value));
        }
        self.verify_outputs(&merged)?;
        Ok(merged)
    }

    // Every declared output was parsed above, so a hole here is a
    // programming error, not a model failure.
    fn verify_outputs(&self, merged: &Bindings) -> Result<(), RunnerError> {
        for output in &self.prompt.outputs {
            if !merged.contains_key(&output.name) {
                return Err(RunnerError::MissingOutput(output.name.clone()));
            }
        }
        Ok(())
    }

    /// Run every output's checks against `bindings`. Judge usage lands
    /// on this runner's counter.
    pub async fn evaluate(&mut self, bindings: &Bindings, options: &EvaluateOptions) -> EvalReport {
        let mut report = EvalReport::default();
        for output in &self.prompt.outputs {
            let outcome = evaluate_field(
                &self.provider,
                &self.completion,
                &self.retry,
                &output.evaluations,
                bindings,
                options,
            )
            .await;
            self.session.merge_tokens(&outcome.tokens);
            report.set(output.name.clone(), outcome.failures);
        }
        report
    }

    /// Evaluate and revise until every check passes or the budget is
    /// spent. Each round stops at the first failing check per field and
    /// issues one corrective call per failing field. Returns the final
    /// bindings; callers that need the verdict evaluate the result
    /// themselves.
    pub async fn revise(&mut self, bindings: &Bindings, options: &ReviseOptions) -> Bindings {
        let evaluate_options = EvaluateOptions {
            break_after_first_fail: true,
            deterministic_only: options.deterministic_only,
        };
        let outputs = self.prompt.outputs.clone();
        let mut current = bindings.clone();
        for round in 1..=options.max_revisions {
            let report = self.evaluate(&current, &evaluate_options).await;
            if report.passed() {
                break;
            }
            for output in &outputs {
                let Some(failure) = report.failures_for(&output.name).first() else {
                    continue;
                };
                info!("Revision {}: `{}`", round, output.name);
                debug!(?failure, "Revising for failing check");
                if let Some(value) = self.revise_field(output, failure, &current).await {
                    current.insert(output.name.clone(), Value::String(value));
                }
            }
        }
        current
    }

    /// One corrective call for one failing field. Returns the revised
    /// value, or `None` when the model produced nothing usable.
    async fn revise_field(
        &mut self,
        output: &OutputField,
        failure: &EvalResult,
        current: &Bindings,
    ) -> Option<String> {
        let revision = self.prompt.revision_prompt(output);
        let mut seeded = current.clone();
        seeded.insert(
            "evaluation_result".to_string(),
            Value::String(serde_json::to_string_pretty(failure).unwrap_or_default()),
        );

        let mut session = self.sub_session();
        let reply = match session.send(&revision.render_with(&seeded)).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(field = %output.name, %error, "Revision call failed, keeping the current value");
                String::new()
            }
        };
        self.session.merge_tokens(session.tokens());

        let value = parse_one_tag(&reply, &output.name).trim().to_string();
        if value.is_empty() {
            debug!(field = %output.name, "Ignoring empty revision");
            None
        } else {
            Some(value)
        }
    }

    /// Generate, then revise, one record.
    pub async fn run(
        &mut self,
        bindings: &Bindings,
        options: &ReviseOptions,
    ) -> Result<Bindings, RunnerError> {
        let generated = self.generate(bindings).await?;
        Ok(self.revise(&generated, options).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMessage, CompletionResponse, ProviderError, TokenUsage};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use promptloop_core::evals::{LlmJudged, MaxChars};
    use promptloop_core::Field;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const USAGE: TokenUsage = TokenUsage {
        input_tokens: 10,
        output_tokens: 5,
    };

    struct ScriptedProvider {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
        message_counts: Mutex<Vec<usize>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|reply| reply.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
                message_counts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn prompt(&self, index: usize) -> String {
            self.prompts.lock()[index].clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.message_counts.lock().push(messages.len());
            if let Some(last) = messages.last() {
                self.prompts.lock().push(last.content.clone());
            }
            let content = self.replies.lock().pop_front().unwrap_or_default();
            Ok(CompletionResponse {
                content,
                usage: USAGE,
                model: "scripted".to_string(),
                stop_reason: Some("end_turn".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl LlmProvider for FailingProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Err(ProviderError::ApiError {
                status: 400,
                message: "bad request".to_string(),
            })
        }

        async fn health_check(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    // Replies with a value half as long as the one it answered last
    // time, like a model slowly taking a length limit seriously.
    struct HalvingProvider {
        value: Mutex<String>,
        calls: AtomicUsize,
    }

    impl HalvingProvider {
        fn new(initial: &str) -> Arc<Self> {
            Arc::new(Self {
                value: Mutex::new(initial.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for HalvingProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut value = self.value.lock();
            let half: String = value.chars().take(value.chars().count() / 2).collect();
            *value = half.clone();
            Ok(CompletionResponse {
                content: format!("<thinking>shorter</thinking>\n<title>{half}</title>"),
                usage: USAGE,
                model: "halving".to_string(),
                stop_reason: Some("end_turn".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "halving"
        }
    }

    fn title_prompt(max_chars: usize) -> Prompt {
        let topic = Field::new("topic", "A topic to write about");
        let title = OutputField::new("title", "A short title")
            .with_inputs(vec![topic.clone()])
            .with_evaluations(vec![Evaluation::MaxChars(MaxChars::new("title", max_chars))]);
        Prompt::new("Write a title.")
            .with_inputs(vec![topic])
            .with_outputs(vec![title])
    }

    fn topic_bindings(topic: &str) -> Bindings {
        let mut bindings = Bindings::new();
        bindings.insert("topic".to_string(), json!(topic));
        bindings
    }

    fn runner(provider: Arc<dyn LlmProvider>, prompt: Prompt) -> PromptRunner {
        PromptRunner::new(provider, prompt).with_retry_policy(RetryPolicy::none())
    }

    #[tokio::test]
    async fn generate_parses_and_trims_declared_outputs() {
        let provider = ScriptedProvider::new(&["<title>\n  Morning Frost  \n</title>"]);
        let mut runner = runner(Arc::clone(&provider) as Arc<dyn LlmProvider>, title_prompt(50));

        let result = runner.generate(&topic_bindings("winter")).await.unwrap();
        assert_eq!(result["title"], json!("Morning Frost"));
        assert_eq!(result["topic"], json!("winter"));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn generate_survives_transport_failure() {
        let mut runner = runner(Arc::new(FailingProvider), title_prompt(50));

        let result = runner.generate(&topic_bindings("winter")).await.unwrap();
        assert_eq!(result["title"], json!(""));
    }

    #[tokio::test]
    async fn generate_does_not_leak_history_between_records() {
        let provider = ScriptedProvider::new(&["<title>One</title>", "<title>Two</title>"]);
        let mut runner = runner(Arc::clone(&provider) as Arc<dyn LlmProvider>, title_prompt(50));

        runner.generate(&topic_bindings("first topic")).await.unwrap();
        runner.generate(&topic_bindings("second topic")).await.unwrap();

        assert_eq!(*provider.message_counts.lock(), vec![1, 1]);
        assert!(provider.prompt(1).contains("second topic"));
        assert!(!provider.prompt(1).contains("first topic"));
    }

    #[tokio::test]
    async fn system_prompt_rides_along_on_every_generation() {
        let provider = ScriptedProvider::new(&["<title>One</title>", "<title>Two</title>"]);
        let mut runner = PromptRunner::new(
            Arc::clone(&provider) as Arc<dyn LlmProvider>,
            title_prompt(50),
        )
        .with_retry_policy(RetryPolicy::none())
        .with_system_prompt("You are a poet.");

        runner.generate(&topic_bindings("first")).await.unwrap();
        runner.generate(&topic_bindings("second")).await.unwrap();

        // System message plus exactly one user turn, both times.
        assert_eq!(*provider.message_counts.lock(), vec![2, 2]);
    }

    #[tokio::test]
    async fn evaluate_collects_failures_per_field() {
        let topic = Field::new("topic", "A topic to write about");
        let title = OutputField::new("title", "A short title")
            .with_inputs(vec![topic.clone()])
            .with_evaluations(vec![
                Evaluation::MaxChars(MaxChars::new("title", 3)),
                Evaluation::MaxChars(MaxChars::new("title", 1)),
            ]);
        let prompt = Prompt::new("Write a title.")
            .with_inputs(vec![topic])
            .with_outputs(vec![title]);
        let provider = ScriptedProvider::new(&[]);
        let mut runner = runner(provider, prompt);

        let mut record = topic_bindings("winter");
        record.insert("title".to_string(), json!("abcdef"));

        let report = runner.evaluate(&record, &EvaluateOptions::default()).await;
        assert!(!report.passed());
        assert_eq!(report.failures_for("title").len(), 2);
        assert_eq!(report.failing_fields(), vec!["title"]);

        let first_only = runner
            .evaluate(
                &record,
                &EvaluateOptions {
                    break_after_first_fail: true,
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(first_only.failures_for("title").len(), 1);
        assert!(first_only.failures_for("title")[0]
            .reason
            .contains("at most 3 chars"));
    }

    #[tokio::test]
    async fn deterministic_checks_short_circuit_judged_ones() {
        let topic = Field::new("topic", "A topic to write about");
        let title = OutputField::new("title", "A short title")
            .with_inputs(vec![topic.clone()])
            .with_evaluations(vec![
                Evaluation::LlmJudged(LlmJudged::new("title", "Must sparkle")),
                Evaluation::MaxChars(MaxChars::new("title", 3)),
            ]);
        let prompt = Prompt::new("Write a title.")
            .with_inputs(vec![topic])
            .with_outputs(vec![title]);
        let provider = ScriptedProvider::new(&[]);
        let mut runner = runner(Arc::clone(&provider) as Arc<dyn LlmProvider>, prompt);

        let mut record = topic_bindings("winter");
        record.insert("title".to_string(), json!("much too long"));

        let report = runner
            .evaluate(
                &record,
                &EvaluateOptions {
                    break_after_first_fail: true,
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(report.failures_for("title").len(), 1);
        assert_eq!(provider.calls(), 0);
        assert_eq!(runner.tokens().grand_total(), 0);
    }

    #[tokio::test]
    async fn deterministic_only_skips_judged_checks() {
        let topic = Field::new("topic", "A topic to write about");
        let title = OutputField::new("title", "A short title")
            .with_inputs(vec![topic.clone()])
            .with_evaluations(vec![Evaluation::LlmJudged(LlmJudged::new(
                "title",
                "Must sparkle",
            ))]);
        let prompt = Prompt::new("Write a title.")
            .with_inputs(vec![topic])
            .with_outputs(vec![title]);
        let provider = ScriptedProvider::new(&[]);
        let mut runner = runner(Arc::clone(&provider) as Arc<dyn LlmProvider>, prompt);

        let mut record = topic_bindings("winter");
        record.insert("title".to_string(), json!("anything at all"));

        let report = runner
            .evaluate(
                &record,
                &EvaluateOptions {
                    deterministic_only: true,
                    ..Default::default()
                },
            )
            .await;

        assert!(report.passed());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn judged_failure_drives_a_revision() {
        let topic = Field::new("topic", "A topic to write about");
        let title = OutputField::new("title", "A short title")
            .with_inputs(vec![topic.clone()])
            .with_evaluations(vec![Evaluation::LlmJudged(LlmJudged::new(
                "title",
                "Must sparkle",
            ))]);
        let prompt = Prompt::new("Write a title.")
            .with_inputs(vec![topic])
            .with_outputs(vec![title]);
        let provider = ScriptedProvider::new(&[
            "<thinking>Dull.</thinking>\n<evaluation_result>FAIL</evaluation_result>\n<reason>Too plain.</reason>",
            "<thinking>Add shine.</thinking>\n<title>Glittering Dawn</title>",
            "<evaluation_result>PASS</evaluation_result>\n<reason></reason>",
        ]);
        let mut runner = runner(Arc::clone(&provider) as Arc<dyn LlmProvider>, prompt);

        let mut record = topic_bindings("winter");
        record.insert("title".to_string(), json!("Morning"));

        let revised = runner.revise(&record, &ReviseOptions::default()).await;
        assert_eq!(revised["title"], json!("Glittering Dawn"));
        assert_eq!(provider.calls(), 3);
        assert_eq!(runner.tokens().total_input, 30);
        assert_eq!(runner.tokens().total_output, 15);
    }

    #[tokio::test]
    async fn revision_converges_then_stops_calling() {
        let provider = HalvingProvider::new("aaaaaaaaaaaaaaaa");
        let mut runner = runner(Arc::clone(&provider) as Arc<dyn LlmProvider>, title_prompt(2));

        let mut record = topic_bindings("winter");
        record.insert("title".to_string(), json!("aaaaaaaaaaaaaaaa"));

        let revised = runner.revise(&record, &ReviseOptions::default()).await;
        let title = revised["title"].as_str().unwrap();
        assert!(title.chars().count() <= 2);
        // 16 -> 8 -> 4 -> 2: three corrective calls, then a clean pass.
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn revision_budget_bounds_generation_attempts() {
        let provider = ScriptedProvider::new(&[
            "<title>Far too long a title</title>",
            "<thinking>t</thinking>\n<title>Still much too long</title>",
            "<thinking>t</thinking>\n<title>Still much too long</title>",
            "<thinking>t</thinking>\n<title>Still much too long</title>",
        ]);
        let mut runner = runner(Arc::clone(&provider) as Arc<dyn LlmProvider>, title_prompt(3));

        let generated = runner.generate(&topic_bindings("winter")).await.unwrap();
        let revised = runner
            .revise(
                &generated,
                &ReviseOptions {
                    max_revisions: 3,
                    ..Default::default()
                },
            )
            .await;

        // One initial generation plus exactly three revision rounds.
        assert_eq!(provider.calls(), 4);
        assert_eq!(revised["title"], json!("Still much too long"));
    }

    #[tokio::test]
    async fn empty_revisions_keep_the_current_value() {
        let provider = ScriptedProvider::new(&[
            "<thinking>t</thinking>\n<title>   </title>",
            "<thinking>t</thinking>\n<title></title>",
        ]);
        let mut runner = runner(Arc::clone(&provider) as Arc<dyn LlmProvider>, title_prompt(3));

        let mut record = topic_bindings("winter");
        record.insert("title".to_string(), json!("Original value"));

        let revised = runner
            .revise(
                &record,
                &ReviseOptions {
                    max_revisions: 2,
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(revised["title"], json!("Original value"));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn revision_prompt_carries_value_and_failure() {
        let provider = ScriptedProvider::new(&["<thinking>t</thinking>\n<title>Ok</title>"]);
        let mut runner = runner(Arc::clone(&provider) as Arc<dyn LlmProvider>, title_prompt(3));

        let mut record = topic_bindings("winter");
        record.insert("title".to_string(), json!("Winter morning frost"));

        let _ = runner
            .revise(
                &record,
                &ReviseOptions {
                    max_revisions: 1,
                    ..Default::default()
                },
            )
            .await;

        let prompt = provider.prompt(0);
        assert!(prompt.contains("Winter morning frost"));
        assert!(prompt.contains("\"evaluation_result\": \"FAIL\""));
        assert!(prompt.contains("at most 3 chars"));
    }

    #[tokio::test]
    async fn run_chains_generation_and_revision() {
        let provider = ScriptedProvider::new(&[
            "<title>Too long to pass</title>",
            "<thinking>t</thinking>\n<title>Ok</title>",
        ]);
        let mut runner = runner(Arc::clone(&provider) as Arc<dyn LlmProvider>, title_prompt(3));

        let finished = runner
            .run(&topic_bindings("winter"), &ReviseOptions::default())
            .await
            .unwrap();
        assert_eq!(finished["title"], json!("Ok"));
        assert_eq!(provider.calls(), 2);
    }

    #[test]
    fn verify_outputs_flags_missing_fields() {
        let provider = ScriptedProvider::new(&[]);
        let runner = PromptRunner::new(provider, title_prompt(3));

        let err = runner.verify_outputs(&Bindings::new()).unwrap_err();
        assert!(matches!(err, RunnerError::MissingOutput(field) if field == "title"));
    }
}
