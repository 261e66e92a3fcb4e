//! Graph validation error type.

use thiserror::Error;
use uuid::Uuid;

/// Errors produced by [`crate::validate_dag`] / [`crate::topological_batches`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An edge references a node id that doesn't exist in the workflow.
    #[error("edge references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference { node_id: Uuid, side: &'static str },

    /// An edge's endpoints belong to different workflows.
    #[error("edge {edge_id} spans workflows: {from_workflow} -> {to_workflow}")]
    CrossWorkflowEdge {
        edge_id: Uuid,
        from_workflow: Uuid,
        to_workflow: Uuid,
    },

    /// Two edges share identical endpoints and ports.
    #[error("duplicate edge {from} -> {to} (ports {from_port}/{to_port})")]
    DuplicateEdge {
        from: Uuid,
        to: Uuid,
        from_port: String,
        to_port: String,
    },

    /// The graph is not acyclic. `witness` is a node sequence that forms the
    /// cycle (first and last element are the same node id).
    #[error("workflow graph contains a cycle: {witness:?}")]
    CycleDetected { witness: Vec<Uuid> },
}
