//! JobStep persistence (spec §3/§4.5): one row per dispatched node per job.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::JobStepRow, DbError};

/// Everything needed to record a step's dispatch before its outcome is
/// known — `engine::RunCoordinator` inserts one of these per node in a
/// batch, then calls [`finish_job_step`] once the node's future resolves.
pub struct NewJobStep {
    pub job_id: Uuid,
    pub node_id: Option<Uuid>,
    pub node_type: &'static str,
    pub started_at: DateTime<Utc>,
    pub input_text: String,
    pub config_snapshot: serde_json::Value,
}

pub async fn insert_job_step(pool: &PgPool, step: NewJobStep) -> Result<JobStepRow, DbError> {
    let id = Uuid::new_v4();

    let row = sqlx::query_as!(
        JobStepRow,
        r#"
        INSERT INTO job_steps
            (id, job_id, node_id, node_type, status, started_at, finished_at, input_text, output_text, error_message, config_snapshot)
        VALUES ($1, $2, $3, $4, 'running', $5, NULL, $6, NULL, NULL, $7)
        RETURNING id, job_id, node_id, node_type, status, started_at, finished_at, input_text, output_text, error_message, config_snapshot
        "#,
        id,
        step.job_id,
        step.node_id,
        step.node_type,
        step.started_at,
        step.input_text,
        step.config_snapshot,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Record a step's terminal outcome (spec §4.5: "persist each JobStep with
/// final status, timings, input_text ..., output_text / error_message").
pub async fn finish_job_step(
    pool: &PgPool,
    step_id: Uuid,
    status: &str,
    output_text: Option<&str>,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query!(
        r#"
        UPDATE job_steps
        SET status = $1, finished_at = $2, output_text = $3, error_message = $4
        WHERE id = $5
        "#,
        status,
        Utc::now(),
        output_text,
        error_message,
        step_id,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_steps(pool: &PgPool, job_id: Uuid) -> Result<Vec<JobStepRow>, DbError> {
    let rows = sqlx::query_as!(
        JobStepRow,
        r#"
        SELECT id, job_id, node_id, node_type, status, started_at, finished_at, input_text, output_text, error_message, config_snapshot
        FROM job_steps
        WHERE job_id = $1
        ORDER BY started_at ASC
        "#,
        job_id,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
