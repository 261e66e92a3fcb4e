//! The bounded plan/act/observe loop (spec §4.4), modeled as an explicit
//! state machine rather than recursion (spec §9) so termination is easy to
//! reason about and to test.

use std::time::{Duration, Instant};

use core::FlowError;
use nodes::config::{AgentConfig, AgentTool};
use nodes::{apply_rules, classify, NodeError};
use services::{LlmRequest, Services};
use tracing::{info, warn};

use crate::planner::{self, PlannerAction, AGENT_MODEL};
use crate::termination::{annotate, budget_exhausted, TerminationReason};

/// Base delay for the agent's exponential backoff (spec §4.4: "1 s, 2 s, 4 s").
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Run one agent invocation to completion or failure.
///
/// `input_text` seeds the scratch the objective operates over, mirroring
/// how `generative_ai` treats its aggregated input (spec §4.2).
pub async fn run_agent(config: &AgentConfig, input_text: &str, services: &Services) -> Result<String, FlowError> {
    if !config.tools.contains(&AgentTool::LlmCall) && !config.tools.contains(&AgentTool::Formatter) {
        return Err(FlowError::Validation("agent tool whitelist is empty".into()));
    }

    let started = Instant::now();
    let budget = Duration::from_secs_f64(config.budgets.execution_time.max(0.0));
    let mut scratch = input_text.to_string();

    for iteration in 1..=config.max_iterations() {
        if started.elapsed() >= budget {
            warn!(iteration, "agent time budget exhausted");
            return Err(budget_exhausted(TerminationReason::TimeBudgetExhausted));
        }

        let action = call_with_retry(config, started, budget, || {
            planner::plan(services, &config.objective, &scratch, &config.tools)
        })
        .await
        .map_err(|e| annotate(TerminationReason::PlannerError, e))?;

        match action {
            PlannerAction::Finish => {
                info!(iteration, "agent reached objective_met");
                return Ok(scratch);
            }
            PlannerAction::LlmCall { prompt } => {
                if !config.tools.contains(&AgentTool::LlmCall) {
                    return Err(annotate(
                        TerminationReason::ToolError,
                        FlowError::Validation("planner chose llm_call outside the tool whitelist".into()),
                    ));
                }
                let output = call_with_retry(config, started, budget, || act_llm_call(services, &prompt))
                    .await
                    .map_err(|e| annotate(TerminationReason::ToolError, e))?;
                observe(&mut scratch, &output);
            }
            PlannerAction::Formatter => {
                if !config.tools.contains(&AgentTool::Formatter) {
                    return Err(annotate(
                        TerminationReason::ToolError,
                        FlowError::Validation("planner chose formatter outside the tool whitelist".into()),
                    ));
                }
                let rules = config.formatting_rules.clone().unwrap_or_default();
                let output = apply_rules(&scratch, &rules).map_err(|e| annotate(TerminationReason::ToolError, e))?;
                scratch = output;
            }
        }
    }

    warn!(max_iterations = config.max_iterations(), "agent hit the iteration limit");
    Err(budget_exhausted(TerminationReason::IterationLimit))
}

fn observe(scratch: &mut String, tool_output: &str) {
    if scratch.is_empty() {
        *scratch = tool_output.to_string();
    } else {
        scratch.push_str("\n\n");
        scratch.push_str(tool_output);
    }
}

async fn act_llm_call(services: &Services, prompt: &str) -> Result<String, FlowError> {
    let response = services
        .llm
        .complete(LlmRequest {
            model: AGENT_MODEL.to_string(),
            prompt: prompt.to_string(),
            temperature: None,
            max_tokens: None,
            top_p: None,
        })
        .await
        .map_err(FlowError::from)?;
    Ok(response.text)
}

/// Apply the shared per-call timeout, overall time budget, and
/// retry/backoff policy (spec §4.4) around one plan or act step. Generic
/// over the call's output type so both the plan step (returns a
/// [`PlannerAction`]) and the act step (returns raw tool output text) share
/// one timeout/backoff implementation.
async fn call_with_retry<F, Fut, T>(
    config: &AgentConfig,
    started: Instant,
    budget: Duration,
    mut call: F,
) -> Result<T, FlowError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, FlowError>>,
{
    let timeout = Duration::from_secs(config.timeout_seconds() as u64);
    let mut attempt = 0u32;

    loop {
        if started.elapsed() >= budget {
            return Err(budget_exhausted(TerminationReason::TimeBudgetExhausted));
        }

        let outcome = tokio::time::timeout(timeout, call()).await;

        let err = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => FlowError::UpstreamUnavailable(format!("tool call exceeded {}s timeout", timeout.as_secs())),
        };

        match classify(&err) {
            NodeError::Fatal(_) => return Err(err),
            NodeError::Retryable(_) => {
                if attempt >= config.max_retries() {
                    return Err(err);
                }
                let delay = RETRY_BASE_DELAY * 2u32.pow(attempt);
                warn!(attempt, ?delay, "retrying agent tool call after transient failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
