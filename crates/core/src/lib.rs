//! `core` crate — shared domain types and error kinds.
//!
//! Every crate above `db` (graph, services, nodes, agent, scheduler, engine,
//! api) depends on this crate so they share one vocabulary for workflows,
//! nodes, edges, jobs, and the five error kinds from spec §7.

pub mod error;
pub mod models;

pub use error::FlowError;
pub use models::{
    truncate_for_storage, Edge, Job, JobStatus, JobStep, Node, NodeType, UploadedFile, Workflow,
    STEP_TEXT_STORAGE_LIMIT,
};
