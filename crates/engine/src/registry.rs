//! Maps a node's declared type (spec §4.2) to its executor implementation.
//! The four node types are closed over at compile time, so every
//! `NodeType` variant always resolves — there is no "unknown executor"
//! error path to model.

use std::collections::HashMap;
use std::sync::Arc;

use agent::AgentNode;
use core::NodeType;
use nodes::{ExecutableNode, ExtractTextNode, FormatterNode, GenerativeAiNode};

#[derive(Clone)]
pub struct NodeRegistry {
    executors: HashMap<NodeType, Arc<dyn ExecutableNode>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        let mut executors: HashMap<NodeType, Arc<dyn ExecutableNode>> = HashMap::new();
        executors.insert(NodeType::ExtractText, Arc::new(ExtractTextNode));
        executors.insert(NodeType::GenerativeAi, Arc::new(GenerativeAiNode));
        executors.insert(NodeType::Formatter, Arc::new(FormatterNode));
        executors.insert(NodeType::Agent, Arc::new(AgentNode));
        Self { executors }
    }

    pub fn resolve(&self, node_type: NodeType) -> Arc<dyn ExecutableNode> {
        self.executors
            .get(&node_type)
            .cloned()
            .unwrap_or_else(|| unreachable!("every NodeType variant is registered at construction"))
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
