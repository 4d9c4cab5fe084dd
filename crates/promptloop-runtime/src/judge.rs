//! Model-judged evaluation execution.
//!
//! A judged check is itself a small prompt: the judge sees the inputs,
//! the value under evaluation and the requirement, and answers with a
//! PASS/FAIL verdict plus a reason. Anything other than a PASS verdict,
//! an empty or garbled reply included, fails the check.

use std::sync::Arc;

use tracing::warn;

use promptloop_core::evals::{LlmJudged, REASON_FIELD, VERDICT_FIELD};
use promptloop_core::{parse_one_tag, Bindings, EvalResult};

use crate::providers::{CompletionConfig, LlmProvider};
use crate::session::{ChatSession, RetryPolicy, Tokens};

/// Run one judged evaluation on a fresh session.
///
/// Returns the verdict and the tokens the judge consumed; the caller
/// merges the usage into its own counter. A transport failure after
/// retries degrades to an empty reply, which fails the check rather
/// than aborting the run.
pub async fn run_judged_evaluation(
    provider: Arc<dyn LlmProvider>,
    completion: &CompletionConfig,
    retry: &RetryPolicy,
    judged: &LlmJudged,
    bindings: &Bindings,
) -> (EvalResult, Tokens) {
    let prompt = judged.judge_prompt();
    let seeded = judged.judge_bindings(bindings);
    let mut session =
        ChatSession::new(provider, completion.clone()).with_retry_policy(retry.clone());

    let reply = match session.send(&prompt.render_with(&seeded)).await {
        Ok(reply) => reply,
        Err(error) => {
            warn!(field = %judged.field, %error, "Judge call failed, treating the reply as empty");
            String::new()
        }
    };

    let verdict = parse_one_tag(&reply, VERDICT_FIELD).trim().to_string();
    let reason = parse_one_tag(&reply, REASON_FIELD).trim().to_string();
    let result = if verdict == "PASS" {
        EvalResult::pass(&judged.field, &judged.requirement)
    } else {
        EvalResult::fail(&judged.field, &judged.requirement, reason)
    };
    (result, *session.tokens())
}
