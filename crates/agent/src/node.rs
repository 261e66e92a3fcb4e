//! The `agent` node type (spec §4.2): delegates to the C3 runtime.

use async_trait::async_trait;
use core::FlowError;
use nodes::config::parse_agent;
use nodes::traits::ExecutableNode;
use serde_json::Value;
use services::Services;

use crate::runtime::run_agent;

pub struct AgentNode;

#[async_trait]
impl ExecutableNode for AgentNode {
    async fn execute(&self, config_snapshot: &Value, input_text: &str, services: &Services) -> Result<String, FlowError> {
        let config = parse_agent(config_snapshot)?;
        run_agent(&config, input_text, services).await
    }
}
