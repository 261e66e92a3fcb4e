//! LLM client capability — grounded on the `llm` crate in `pcastone-orca`
//! (reqwest behind an `async_trait`) and `agent-network`'s `LlmClient::chat`
//! shape in the svelte-rust-agents-sdk pack.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::ServiceError;

/// Models the `generative_ai` and `agent` node types are allowed to call
/// (spec §4.2).
pub const ALLOWED_MODELS: &[&str] = &["gpt-4.1-mini", "gpt-4o", "gpt-5"];

/// Per-LLM-call timeout (spec §5).
pub const LLM_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// A single completion request.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
}

/// The LLM's response text.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    pub text: String,
}

/// Capability every `generative_ai` node, and every `llm_call` agent tool,
/// dispatches through. `services` is the bundle named in spec §4.2.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, ServiceError>;
}

fn validate_model(model: &str) -> Result<(), ServiceError> {
    if ALLOWED_MODELS.contains(&model) {
        Ok(())
    } else {
        Err(ServiceError::UnsupportedModel(model.to_string()))
    }
}

/// Production `LlmClient` backed by an HTTP completions endpoint
/// (`LLM_API_BASE`/`LLM_API_KEY`, spec §6).
pub struct HttpLlmClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl HttpLlmClient {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(LLM_CALL_TIMEOUT)
            .build()
            .expect("reqwest client builder should not fail on default TLS config");
        Self { http, api_base: api_base.into(), api_key: api_key.into() }
    }
}

#[derive(Serialize)]
struct CompletionPayload<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

#[derive(Deserialize)]
struct CompletionBody {
    text: String,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, ServiceError> {
        validate_model(&request.model)?;

        let payload = CompletionPayload {
            model: &request.model,
            prompt: &request.prompt,
            temperature: request.temperature,
            max_tokens: request.max_tokens.or(Some(1000)),
            top_p: request.top_p,
        };

        let response = self
            .http
            .post(format!("{}/v1/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                warn!("llm transport error: {e}");
                ServiceError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::NonSuccessResponse { status: status.as_u16(), body });
        }

        let body: CompletionBody = response
            .json()
            .await
            .map_err(|e| ServiceError::Transport(format!("invalid response body: {e}")))?;

        Ok(LlmResponse { text: body.text })
    }
}
