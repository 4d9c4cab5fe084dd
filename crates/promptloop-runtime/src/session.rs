//! Chat sessions and token accounting.
//!
//! A [`ChatSession`] owns the message history for one conversation with a
//! provider: `send` pushes the user turn, runs the completion with retries
//! on transient failures, records the assistant turn and counts tokens.
//! Controllers clear the session before every independent prompt
//! invocation so one record's exchange never leaks into the next.

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::{debug, info, warn};

use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError, TokenUsage};

/// Retry schedule for transient provider failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: usize,
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Ceiling for the exponential schedule.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries; the first failure surfaces as-is.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
    }
}

/// Running token counter: the most recent call's pair plus lifetime totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tokens {
    pub last_input: u64,
    pub last_output: u64,
    pub total_input: u64,
    pub total_output: u64,
}

impl Tokens {
    /// Record one completion's usage.
    pub fn record(&mut self, usage: &TokenUsage) {
        self.last_input = u64::from(usage.input_tokens);
        self.last_output = u64::from(usage.output_tokens);
        self.total_input += self.last_input;
        self.total_output += self.last_output;
    }

    /// Fold another counter's totals into this one. The last pair stays
    /// this counter's own: nested judge and revision calls add to the
    /// totals without posing as the most recent call here.
    pub fn merge(&mut self, other: &Tokens) {
        self.total_input += other.total_input;
        self.total_output += other.total_output;
    }

    /// The most recent call's usage, formatted for logs.
    pub fn last(&self) -> String {
        format!("in: {}, out: {}", self.last_input, self.last_output)
    }

    /// Lifetime usage, formatted for logs.
    pub fn total(&self) -> String {
        format!("in: {}, out: {}", self.total_input, self.total_output)
    }

    /// Lifetime tokens in both directions combined.
    pub fn grand_total(&self) -> u64 {
        self.total_input + self.total_output
    }
}

/// One conversation with a provider.
pub struct ChatSession {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
    retry: RetryPolicy,
    system_prompt: Option<String>,
    history: Vec<ChatMessage>,
    tokens: Tokens,
}

impl ChatSession {
    pub fn new(provider: Arc<dyn LlmProvider>, config: CompletionConfig) -> Self {
        Self {
            provider,
            config,
            retry: RetryPolicy::default(),
            system_prompt: None,
            history: Vec::new(),
            tokens: Tokens::default(),
        }
    }

    /// Pin a system message to the front of every exchange. Empty text
    /// leaves the session without one.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        let text = system_prompt.into();
        self.system_prompt = (!text.is_empty()).then_some(text);
        self.clear();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Reset the history to just the system message, if any. The token
    /// counter is untouched.
    pub fn clear(&mut self) {
        self.history.clear();
        if let Some(system_prompt) = &self.system_prompt {
            self.history.push(ChatMessage::system(system_prompt));
        }
    }

    /// Messages exchanged so far, system message included.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn tokens(&self) -> &Tokens {
        &self.tokens
    }

    /// Fold a nested session's usage into this session's counter.
    pub fn merge_tokens(&mut self, other: &Tokens) {
        self.tokens.merge(other);
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Send one user turn and return the assistant's reply.
    ///
    /// Transient failures are retried per the session's [`RetryPolicy`];
    /// the final error goes back to the caller, which decides whether it
    /// is fatal.
    pub async fn send(&mut self, prompt: &str) -> Result<String, ProviderError> {
        self.history.push(ChatMessage::user(prompt));

        let provider = Arc::clone(&self.provider);
        let config = self.config.clone();
        let messages = self.history.clone();
        let response = (move || {
            let provider = Arc::clone(&provider);
            let config = config.clone();
            let messages = messages.clone();
            async move { provider.complete(messages, &config).await }
        })
        .retry(self.retry.backoff())
        .when(ProviderError::is_transient)
        .notify(|error: &ProviderError, delay: Duration| {
            warn!(%error, delay_ms = delay.as_millis() as u64, "Transient provider failure, retrying");
        })
        .await?;

        self.history.push(ChatMessage::assistant(&response.content));
        self.tokens.record(&response.usage);
        debug!(reply = %response.content, "Assistant reply");
        info!(last = %self.tokens.last(), total = %self.tokens.total(), "Token usage");
        Ok(response.content)
    }
}
