//! The plan step (spec §4.4.1): ask the LLM for the next action given the
//! objective, the scratch text accumulated so far, and the tool whitelist.

use core::FlowError;
use nodes::config::AgentTool;
use serde::Deserialize;
use services::{LlmRequest, Services};

/// Default model used for the agent's own LLM calls — the agent config
/// schema (spec §4.3) has no `model` field, unlike `generative_ai`, so we
/// fix one rather than inventing a config knob the spec doesn't name.
pub const AGENT_MODEL: &str = "gpt-4.1-mini";

#[derive(Debug, Clone, PartialEq)]
pub enum PlannerAction {
    LlmCall { prompt: String },
    Formatter,
    Finish,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    action: String,
    #[serde(default)]
    prompt: Option<String>,
}

/// Parse the planner's JSON response into an action. A response is
/// considered well-formed only if `action` is one of the three recognized
/// tags and, for `llm_call`, a `prompt` is present.
fn parse_action(raw_response: &str) -> Result<PlannerAction, FlowError> {
    let raw: RawAction = serde_json::from_str(raw_response)
        .map_err(|e| FlowError::Validation(format!("planner response was not valid JSON: {e}")))?;

    match raw.action.as_str() {
        "finish" => Ok(PlannerAction::Finish),
        "formatter" => Ok(PlannerAction::Formatter),
        "llm_call" => {
            let prompt = raw
                .prompt
                .ok_or_else(|| FlowError::Validation("planner chose llm_call with no prompt".into()))?;
            Ok(PlannerAction::LlmCall { prompt })
        }
        other => Err(FlowError::Validation(format!("planner proposed unrecognized action '{other}'"))),
    }
}

fn tool_names(tools: &[AgentTool]) -> String {
    tools
        .iter()
        .map(|t| match t {
            AgentTool::LlmCall => "llm_call",
            AgentTool::Formatter => "formatter",
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn build_planning_prompt(objective: &str, scratch: &str, tools: &[AgentTool]) -> String {
    format!(
        "Objective: {objective}\n\
         Available tools: {tools}\n\
         Progress so far:\n{scratch}\n\n\
         Respond with a single JSON object describing the next action: \
         {{\"action\": \"llm_call\", \"prompt\": \"...\"}}, {{\"action\": \"formatter\"}}, \
         or {{\"action\": \"finish\"}} once the objective is met.",
        tools = tool_names(tools),
    )
}

/// Ask the LLM for the next action. Does not itself retry — the caller
/// (the agent's main loop) applies the shared retry/backoff policy so plan
/// and act steps are retried uniformly.
pub async fn plan(services: &Services, objective: &str, scratch: &str, tools: &[AgentTool]) -> Result<PlannerAction, FlowError> {
    let prompt = build_planning_prompt(objective, scratch, tools);
    let response = services
        .llm
        .complete(LlmRequest {
            model: AGENT_MODEL.to_string(),
            prompt,
            temperature: None,
            max_tokens: None,
            top_p: None,
        })
        .await
        .map_err(FlowError::from)?;

    parse_action(&response.text)
}
