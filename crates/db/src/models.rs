//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models — they carry no domain behaviour and use
//! primitive column types (`status`/`node_type` as `String`) so `sqlx`'s
//! `query_as!` macro can decode them directly. Domain types live in `core`;
//! `TryFrom`/`From` impls below bridge the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// workflows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<WorkflowRow> for core::Workflow {
    fn from(row: WorkflowRow) -> Self {
        core::Workflow { id: row.id, name: row.name, created_at: row.created_at }
    }
}

// ---------------------------------------------------------------------------
// nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NodeRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub node_type: String,
    pub config: serde_json::Value,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NodeRow> for core::Node {
    type Error = DbError;
    fn try_from(row: NodeRow) -> Result<Self, Self::Error> {
        Ok(core::Node {
            id: row.id,
            workflow_id: row.workflow_id,
            node_type: parse_node_type(&row.node_type)?,
            config: row.config,
            order_index: row.order_index,
            created_at: row.created_at,
        })
    }
}

pub(crate) fn parse_node_type(s: &str) -> Result<core::NodeType, DbError> {
    match s {
        "extract_text" => Ok(core::NodeType::ExtractText),
        "generative_ai" => Ok(core::NodeType::GenerativeAi),
        "formatter" => Ok(core::NodeType::Formatter),
        "agent" => Ok(core::NodeType::Agent),
        other => Err(DbError::Decode(format!("unknown node_type '{other}'"))),
    }
}

// ---------------------------------------------------------------------------
// edges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EdgeRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub from_node_id: Uuid,
    pub to_node_id: Uuid,
    pub from_port: String,
    pub to_port: String,
    pub condition: Option<String>,
}

impl From<EdgeRow> for core::Edge {
    fn from(row: EdgeRow) -> Self {
        core::Edge {
            id: row.id,
            workflow_id: row.workflow_id,
            from_node_id: row.from_node_id,
            to_node_id: row.to_node_id,
            from_port: row.from_port,
            to_port: row.to_port,
            condition: row.condition,
        }
    }
}

// ---------------------------------------------------------------------------
// jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub final_output: Option<String>,
    pub error_message: Option<String>,
}

impl TryFrom<JobRow> for core::Job {
    type Error = DbError;
    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(core::Job {
            id: row.id,
            workflow_id: row.workflow_id,
            status: parse_job_status(&row.status)?,
            started_at: row.started_at,
            finished_at: row.finished_at,
            final_output: row.final_output,
            error_message: row.error_message,
        })
    }
}

pub(crate) fn parse_job_status(s: &str) -> Result<core::JobStatus, DbError> {
    s.parse().map_err(DbError::Decode)
}

// ---------------------------------------------------------------------------
// job_steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobStepRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub node_id: Option<Uuid>,
    pub node_type: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub input_text: Option<String>,
    pub output_text: Option<String>,
    pub error_message: Option<String>,
    pub config_snapshot: serde_json::Value,
}

impl TryFrom<JobStepRow> for core::JobStep {
    type Error = DbError;
    fn try_from(row: JobStepRow) -> Result<Self, Self::Error> {
        Ok(core::JobStep {
            id: row.id,
            job_id: row.job_id,
            node_id: row.node_id,
            node_type: parse_node_type(&row.node_type)?,
            status: parse_job_status(&row.status)?,
            started_at: row.started_at,
            finished_at: row.finished_at,
            input_text: row.input_text,
            output_text: row.output_text,
            error_message: row.error_message,
            config_snapshot: row.config_snapshot,
        })
    }
}

// ---------------------------------------------------------------------------
// uploaded_files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UploadedFileRow {
    pub id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl From<UploadedFileRow> for core::UploadedFile {
    fn from(row: UploadedFileRow) -> Self {
        core::UploadedFile {
            id: row.id,
            filename: row.filename,
            mime_type: row.mime_type,
            size_bytes: row.size_bytes,
            path: row.path,
            created_at: row.created_at,
        }
    }
}
