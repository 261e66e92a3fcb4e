//! The node executor seam (spec §4.2). Each [`core::NodeType`] has exactly
//! one implementation; the run coordinator (`engine` crate) looks one up by
//! type and calls `execute` with the node's frozen `config_snapshot` and the
//! aggregated input text from its predecessors.

use async_trait::async_trait;
use core::FlowError;
use serde_json::Value;
use services::Services;

#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Run the node. `config_snapshot` is the config frozen at dispatch time
    /// (spec §4.3), not the node's live, possibly-since-edited config.
    async fn execute(&self, config_snapshot: &Value, input_text: &str, services: &Services) -> Result<String, FlowError>;
}
