//! The `generative_ai` node type (spec §4.2). Substitutes the aggregated
//! input text into the prompt template, then calls the LLM client.

use async_trait::async_trait;
use core::FlowError;
use serde_json::Value;

use crate::config::{parse_generative_ai, DEFAULT_MAX_TOKENS};
use crate::traits::ExecutableNode;
use services::{LlmRequest, Services};

/// Placeholder substituted with the node's aggregated input text.
const TEXT_PLACEHOLDER: &str = "{text}";

/// Build the prompt sent to the LLM. If `prompt` contains `{text}`, the
/// input is substituted in place; otherwise it is appended after a blank
/// line so the model still sees it (spec §9 open question, resolved in
/// favor of never silently dropping input).
pub fn build_prompt(prompt: &str, input_text: &str) -> String {
    if prompt.contains(TEXT_PLACEHOLDER) {
        prompt.replace(TEXT_PLACEHOLDER, input_text)
    } else if input_text.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt}\n\n{input_text}")
    }
}

pub struct GenerativeAiNode;

#[async_trait]
impl ExecutableNode for GenerativeAiNode {
    async fn execute(&self, config_snapshot: &Value, input_text: &str, services: &Services) -> Result<String, FlowError> {
        let config = parse_generative_ai(config_snapshot)?;
        let prompt = build_prompt(&config.prompt, input_text);

        let request = LlmRequest {
            model: config.model,
            prompt,
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
            top_p: config.top_p,
        };

        let response = services.llm.complete(request).await.map_err(FlowError::from)?;
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_placeholder_when_present() {
        let out = build_prompt("Summarize: {text}", "hello world");
        assert_eq!(out, "Summarize: hello world");
    }

    #[test]
    fn appends_after_blank_line_when_placeholder_absent() {
        let out = build_prompt("Summarize the following.", "hello world");
        assert_eq!(out, "Summarize the following.\n\nhello world");
    }

    #[test]
    fn empty_input_with_no_placeholder_leaves_prompt_untouched() {
        let out = build_prompt("Summarize the following.", "");
        assert_eq!(out, "Summarize the following.");
    }

    #[test]
    fn placeholder_can_appear_more_than_once() {
        let out = build_prompt("{text} / {text}", "x");
        assert_eq!(out, "x / x");
    }
}
