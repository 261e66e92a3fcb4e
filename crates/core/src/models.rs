//! Domain types shared by every crate above `db` (spec §3).
//!
//! These are the in-memory source of truth; the `db` crate's row structs map
//! onto the same tables but carry no behaviour.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A workflow: owns nodes and edges, carries no execution state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The four node kinds a workflow can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    ExtractText,
    GenerativeAi,
    Formatter,
    Agent,
}

impl NodeType {
    /// True for node types whose output is not a pure function of their
    /// input (spec §4.5 determinism note).
    pub fn is_nondeterministic(&self) -> bool {
        matches!(self, Self::GenerativeAi | Self::Agent)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ExtractText => "extract_text",
            Self::GenerativeAi => "generative_ai",
            Self::Formatter => "formatter",
            Self::Agent => "agent",
        };
        write!(f, "{s}")
    }
}

/// A typed transform node. `config` is an opaque record whose schema is
/// determined by `node_type` (spec §4.3); `order_index` is only consulted
/// as a tiebreaker when a workflow has zero edges (spec §4.1 fallback).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub node_type: NodeType,
    pub config: serde_json::Value,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

/// A directed dependency between two nodes of the same workflow.
/// `condition` is reserved and ignored by the engine (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub from_node_id: Uuid,
    pub to_node_id: Uuid,
    pub from_port: String,
    pub to_port: String,
    pub condition: Option<String>,
}

/// Status shared by `Job` and `JobStep` (spec §3 invariant 3): monotone
/// `Pending -> Running -> {Succeeded, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// One execution attempt of a workflow (spec §3). Created by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub final_output: Option<String>,
    pub error_message: Option<String>,
}

/// One node's execution record within a job (spec §3). `config_snapshot`
/// freezes the node's config at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStep {
    pub id: Uuid,
    pub job_id: Uuid,
    pub node_id: Option<Uuid>,
    pub node_type: NodeType,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub input_text: Option<String>,
    pub output_text: Option<String>,
    pub error_message: Option<String>,
    pub config_snapshot: serde_json::Value,
}

/// A reference to an externally stored, read-only blob (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

/// Maximum `input_text`/`output_text` length persisted on a `JobStep`
/// (spec §4.5: "truncated for storage if oversized").
pub const STEP_TEXT_STORAGE_LIMIT: usize = 64 * 1024;

/// Truncate `text` to [`STEP_TEXT_STORAGE_LIMIT`] bytes (on a char boundary)
/// for storage, appending a marker so truncation is visible in an audit.
pub fn truncate_for_storage(text: &str) -> String {
    if text.len() <= STEP_TEXT_STORAGE_LIMIT {
        return text.to_string();
    }
    let mut end = STEP_TEXT_STORAGE_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}… [truncated]", &text[..end])
}
