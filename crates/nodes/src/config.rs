//! Per-node-type config schemas (spec §4.3). Validated both at node-creation
//! time (API layer, rejecting with a descriptive error) and again at
//! snapshot time (defense in depth, spec §4.3's "Validation occurs ... at
//! node-creation time and at snapshot time").

use core::{FlowError, NodeType};
use serde::{Deserialize, Serialize};

/// Maximum length of a `generative_ai` prompt (spec §4.2).
pub const MAX_PROMPT_CHARS: usize = 4000;
/// Default `max_tokens` when the config omits it (spec §4.2).
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractTextConfig {
    pub file_id: uuid::Uuid,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerativeAiConfig {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub top_p: Option<f64>,
}

/// Formatter rules, applied in listed order (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatterRule {
    Lowercase,
    Uppercase,
    FullToHalf,
    HalfToFull,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatterConfig {
    #[serde(default)]
    pub rules: Vec<FormatterRule>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentBudgets {
    pub execution_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentTool {
    LlmCall,
    Formatter,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    pub objective: String,
    pub tools: Vec<AgentTool>,
    pub budgets: AgentBudgets,
    #[serde(default)]
    pub max_concurrent: Option<u32>,
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    #[serde(default)]
    pub formatting_rules: Option<Vec<FormatterRule>>,
}

impl AgentConfig {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 3;
    pub const MAX_MAX_CONCURRENT: u32 = 10;
    pub const MAX_TIMEOUT_SECONDS: u32 = 30;
    pub const MAX_MAX_RETRIES: u32 = 3;

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations.unwrap_or(Self::DEFAULT_MAX_ITERATIONS)
    }

    pub fn max_concurrent(&self) -> u32 {
        self.max_concurrent.unwrap_or(1).min(Self::MAX_MAX_CONCURRENT)
    }

    pub fn timeout_seconds(&self) -> u32 {
        self.timeout_seconds.unwrap_or(Self::MAX_TIMEOUT_SECONDS).min(Self::MAX_TIMEOUT_SECONDS)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(Self::MAX_MAX_RETRIES).min(Self::MAX_MAX_RETRIES)
    }
}

fn parse<T: serde::de::DeserializeOwned>(config: &serde_json::Value, node_type: NodeType) -> Result<T, FlowError> {
    serde_json::from_value(config.clone())
        .map_err(|e| FlowError::Validation(format!("invalid {node_type} config: {e}")))
}

pub fn parse_extract_text(config: &serde_json::Value) -> Result<ExtractTextConfig, FlowError> {
    parse(config, NodeType::ExtractText)
}

pub fn parse_generative_ai(config: &serde_json::Value) -> Result<GenerativeAiConfig, FlowError> {
    let cfg: GenerativeAiConfig = parse(config, NodeType::GenerativeAi)?;
    if cfg.prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(FlowError::Validation(format!(
            "prompt exceeds {MAX_PROMPT_CHARS} characters"
        )));
    }
    if !services::ALLOWED_MODELS.contains(&cfg.model.as_str()) {
        return Err(FlowError::Validation(format!("unsupported model '{}'", cfg.model)));
    }
    Ok(cfg)
}

pub fn parse_formatter(config: &serde_json::Value) -> Result<FormatterConfig, FlowError> {
    parse(config, NodeType::Formatter)
}

pub fn parse_agent(config: &serde_json::Value) -> Result<AgentConfig, FlowError> {
    let cfg: AgentConfig = parse(config, NodeType::Agent)?;
    if cfg.tools.is_empty() {
        return Err(FlowError::Validation("agent config requires a non-empty tool whitelist".into()));
    }
    if let Some(n) = cfg.max_concurrent {
        if n > AgentConfig::MAX_MAX_CONCURRENT {
            return Err(FlowError::Validation(format!(
                "max_concurrent {n} exceeds limit of {}",
                AgentConfig::MAX_MAX_CONCURRENT
            )));
        }
    }
    if let Some(n) = cfg.timeout_seconds {
        if n > AgentConfig::MAX_TIMEOUT_SECONDS {
            return Err(FlowError::Validation(format!(
                "timeout_seconds {n} exceeds limit of {}",
                AgentConfig::MAX_TIMEOUT_SECONDS
            )));
        }
    }
    if let Some(n) = cfg.max_retries {
        if n > AgentConfig::MAX_MAX_RETRIES {
            return Err(FlowError::Validation(format!(
                "max_retries {n} exceeds limit of {}",
                AgentConfig::MAX_MAX_RETRIES
            )));
        }
    }
    Ok(cfg)
}

/// Validate a node's config against its declared type. Used both at
/// node-creation time and again at config-snapshot time (spec §4.3).
pub fn validate_config(node_type: NodeType, config: &serde_json::Value) -> Result<(), FlowError> {
    match node_type {
        NodeType::ExtractText => parse_extract_text(config).map(|_| ()),
        NodeType::GenerativeAi => parse_generative_ai(config).map(|_| ()),
        NodeType::Formatter => parse_formatter(config).map(|_| ()),
        NodeType::Agent => parse_agent(config).map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formatter_empty_rules_is_valid() {
        assert!(validate_config(NodeType::Formatter, &json!({ "rules": [] })).is_ok());
    }

    #[test]
    fn formatter_unknown_rule_is_rejected() {
        assert!(validate_config(NodeType::Formatter, &json!({ "rules": ["reticulate"] })).is_err());
    }

    #[test]
    fn generative_ai_requires_allowed_model() {
        let cfg = json!({ "model": "gpt-3", "prompt": "hi" });
        assert!(validate_config(NodeType::GenerativeAi, &cfg).is_err());
        let cfg = json!({ "model": "gpt-4o", "prompt": "hi" });
        assert!(validate_config(NodeType::GenerativeAi, &cfg).is_ok());
    }

    #[test]
    fn generative_ai_prompt_too_long_is_rejected() {
        let cfg = json!({ "model": "gpt-4o", "prompt": "a".repeat(MAX_PROMPT_CHARS + 1) });
        assert!(validate_config(NodeType::GenerativeAi, &cfg).is_err());
    }

    #[test]
    fn agent_requires_nonempty_tools() {
        let cfg = json!({ "objective": "x", "tools": [], "budgets": { "execution_time": 10.0 } });
        assert!(validate_config(NodeType::Agent, &cfg).is_err());
    }

    #[test]
    fn agent_max_concurrent_over_limit_is_rejected() {
        let cfg = json!({
            "objective": "x",
            "tools": ["llm_call"],
            "budgets": { "execution_time": 10.0 },
            "max_concurrent": 11
        });
        assert!(validate_config(NodeType::Agent, &cfg).is_err());
    }
}
