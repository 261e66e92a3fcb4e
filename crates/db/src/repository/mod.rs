//! Repository functions — one function per database operation, plus the
//! [`Repository`] trait abstraction spec §4.7 asks for so `engine` and
//! `scheduler` depend on `Arc<dyn Repository>` instead of `sqlx` directly.
//!
//! No business logic, no cycle/config validation — pure persistence.

pub mod edges;
pub mod files;
pub mod job_steps;
pub mod jobs;
pub mod nodes;
pub mod workflows;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;
pub use job_steps::NewJobStep;

/// The abstract persistence contract the core depends on (spec §4.7).
#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_workflow(&self, name: &str) -> Result<core::Workflow, DbError>;
    async fn get_workflow(&self, id: Uuid) -> Result<core::Workflow, DbError>;

    async fn create_node(
        &self,
        workflow_id: Uuid,
        node_type: core::NodeType,
        config: serde_json::Value,
        order_index: i32,
    ) -> Result<core::Node, DbError>;
    async fn get_node(&self, id: Uuid) -> Result<core::Node, DbError>;
    async fn list_nodes(&self, workflow_id: Uuid) -> Result<Vec<core::Node>, DbError>;
    async fn next_order_index(&self, workflow_id: Uuid) -> Result<i32, DbError>;

    async fn create_edge(
        &self,
        workflow_id: Uuid,
        from_node_id: Uuid,
        to_node_id: Uuid,
        from_port: &str,
        to_port: &str,
        condition: Option<&str>,
    ) -> Result<core::Edge, DbError>;
    async fn list_edges(&self, workflow_id: Uuid) -> Result<Vec<core::Edge>, DbError>;

    async fn submit_job(&self, workflow_id: Uuid, max_running: i64, max_pending: i64) -> Result<core::Job, DbError>;
    async fn promote_next_pending(&self, workflow_id: Uuid, max_running: i64) -> Result<Option<core::Job>, DbError>;
    async fn get_job(&self, id: Uuid) -> Result<core::Job, DbError>;
    async fn list_jobs(&self, workflow_id: Uuid) -> Result<Vec<core::Job>, DbError>;
    async fn get_job_with_steps(&self, job_id: Uuid) -> Result<(core::Job, Vec<core::JobStep>), DbError>;
    async fn finish_job(
        &self,
        job_id: Uuid,
        status: core::JobStatus,
        final_output: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), DbError>;
    async fn running_count(&self, workflow_id: Uuid) -> Result<i64, DbError>;
    async fn pending_count(&self, workflow_id: Uuid) -> Result<i64, DbError>;
    async fn sweep_stale_jobs(&self, older_than: DateTime<Utc>) -> Result<u64, DbError>;

    async fn insert_job_step(&self, step: NewJobStep) -> Result<core::JobStep, DbError>;
    async fn finish_job_step(
        &self,
        step_id: Uuid,
        status: core::JobStatus,
        output_text: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), DbError>;

    async fn create_uploaded_file(
        &self,
        id: Uuid,
        filename: &str,
        mime_type: &str,
        size_bytes: i64,
        path: &str,
    ) -> Result<core::UploadedFile, DbError>;
    async fn get_uploaded_file(&self, id: Uuid) -> Result<core::UploadedFile, DbError>;
}

/// The only [`Repository`] implementation: a thin wrapper over a Postgres
/// pool and the free functions in this module's submodules.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_workflow(&self, name: &str) -> Result<core::Workflow, DbError> {
        Ok(workflows::create_workflow(&self.pool, name).await?.into())
    }

    async fn get_workflow(&self, id: Uuid) -> Result<core::Workflow, DbError> {
        Ok(workflows::get_workflow(&self.pool, id).await?.into())
    }

    async fn create_node(
        &self,
        workflow_id: Uuid,
        node_type: core::NodeType,
        config: serde_json::Value,
        order_index: i32,
    ) -> Result<core::Node, DbError> {
        let row = nodes::create_node(&self.pool, workflow_id, &node_type.to_string(), config, order_index).await?;
        row.try_into()
    }

    async fn get_node(&self, id: Uuid) -> Result<core::Node, DbError> {
        nodes::get_node(&self.pool, id).await?.try_into()
    }

    async fn list_nodes(&self, workflow_id: Uuid) -> Result<Vec<core::Node>, DbError> {
        nodes::list_nodes(&self.pool, workflow_id)
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn next_order_index(&self, workflow_id: Uuid) -> Result<i32, DbError> {
        nodes::next_order_index(&self.pool, workflow_id).await
    }

    async fn create_edge(
        &self,
        workflow_id: Uuid,
        from_node_id: Uuid,
        to_node_id: Uuid,
        from_port: &str,
        to_port: &str,
        condition: Option<&str>,
    ) -> Result<core::Edge, DbError> {
        Ok(edges::create_edge(&self.pool, workflow_id, from_node_id, to_node_id, from_port, to_port, condition)
            .await?
            .into())
    }

    async fn list_edges(&self, workflow_id: Uuid) -> Result<Vec<core::Edge>, DbError> {
        Ok(edges::list_edges(&self.pool, workflow_id).await?.into_iter().map(Into::into).collect())
    }

    async fn submit_job(&self, workflow_id: Uuid, max_running: i64, max_pending: i64) -> Result<core::Job, DbError> {
        jobs::submit_job(&self.pool, workflow_id, max_running, max_pending).await?.try_into()
    }

    async fn promote_next_pending(&self, workflow_id: Uuid, max_running: i64) -> Result<Option<core::Job>, DbError> {
        match jobs::promote_next_pending(&self.pool, workflow_id, max_running).await? {
            Some(row) => Ok(Some(row.try_into()?)),
            None => Ok(None),
        }
    }

    async fn get_job(&self, id: Uuid) -> Result<core::Job, DbError> {
        jobs::get_job(&self.pool, id).await?.try_into()
    }

    async fn list_jobs(&self, workflow_id: Uuid) -> Result<Vec<core::Job>, DbError> {
        jobs::list_jobs(&self.pool, workflow_id)
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn get_job_with_steps(&self, job_id: Uuid) -> Result<(core::Job, Vec<core::JobStep>), DbError> {
        let job = jobs::get_job(&self.pool, job_id).await?.try_into()?;
        let steps = job_steps::list_steps(&self.pool, job_id)
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok((job, steps))
    }

    async fn finish_job(
        &self,
        job_id: Uuid,
        status: core::JobStatus,
        final_output: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), DbError> {
        jobs::finish_job(&self.pool, job_id, &status.to_string(), final_output, error_message).await
    }

    async fn running_count(&self, workflow_id: Uuid) -> Result<i64, DbError> {
        jobs::running_count(&self.pool, workflow_id).await
    }

    async fn pending_count(&self, workflow_id: Uuid) -> Result<i64, DbError> {
        jobs::pending_count(&self.pool, workflow_id).await
    }

    async fn sweep_stale_jobs(&self, older_than: DateTime<Utc>) -> Result<u64, DbError> {
        jobs::sweep_stale_jobs(&self.pool, older_than).await
    }

    async fn insert_job_step(&self, step: NewJobStep) -> Result<core::JobStep, DbError> {
        job_steps::insert_job_step(&self.pool, step).await?.try_into()
    }

    async fn finish_job_step(
        &self,
        step_id: Uuid,
        status: core::JobStatus,
        output_text: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), DbError> {
        job_steps::finish_job_step(&self.pool, step_id, &status.to_string(), output_text, error_message).await
    }

    async fn create_uploaded_file(
        &self,
        id: Uuid,
        filename: &str,
        mime_type: &str,
        size_bytes: i64,
        path: &str,
    ) -> Result<core::UploadedFile, DbError> {
        Ok(files::create_uploaded_file(&self.pool, id, filename, mime_type, size_bytes, path).await?.into())
    }

    async fn get_uploaded_file(&self, id: Uuid) -> Result<core::UploadedFile, DbError> {
        Ok(files::get_uploaded_file(&self.pool, id).await?.into())
    }
}
