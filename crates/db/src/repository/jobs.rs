//! Job lifecycle and admission control (spec §4.6/§4.7).
//!
//! Admission must be transactionally consistent with the running/pending
//! counts (spec §4.7: "strong consistency for admission counts ... under a
//! workflow-scoped lock"). We take `pg_advisory_xact_lock` keyed on the
//! workflow id so concurrent submits against the same workflow serialize,
//! the same role the teacher's `SELECT ... FOR UPDATE SKIP LOCKED` plays for
//! `fetch_next_job` — a lock scoped to the contended resource, held for the
//! lifetime of one transaction.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::JobRow, DbError};

/// Hash a workflow id down to the `bigint` key `pg_advisory_xact_lock` wants.
fn advisory_key(workflow_id: Uuid) -> i64 {
    let bytes = workflow_id.as_bytes();
    i64::from_le_bytes(bytes[0..8].try_into().unwrap())
}

/// Insert a new `Pending` job if the workflow's pending queue has room,
/// promoting it to `Running` immediately if a running slot is free.
/// Returns [`DbError::QueueFull`] if the pending queue is already at
/// `max_pending`.
pub async fn submit_job(
    pool: &PgPool,
    workflow_id: Uuid,
    max_running: i64,
    max_pending: i64,
) -> Result<JobRow, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query!("SELECT pg_advisory_xact_lock($1)", advisory_key(workflow_id))
        .execute(&mut *tx)
        .await?;

    let pending_count: i64 = sqlx::query_scalar!(
        r#"SELECT COUNT(*) as "count!" FROM jobs WHERE workflow_id = $1 AND status = 'pending'"#,
        workflow_id,
    )
    .fetch_one(&mut *tx)
    .await?;

    if pending_count >= max_pending {
        tx.rollback().await?;
        return Err(DbError::QueueFull);
    }

    let running_count: i64 = sqlx::query_scalar!(
        r#"SELECT COUNT(*) as "count!" FROM jobs WHERE workflow_id = $1 AND status = 'running'"#,
        workflow_id,
    )
    .fetch_one(&mut *tx)
    .await?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let status = if running_count < max_running { "running" } else { "pending" };

    let row = sqlx::query_as!(
        JobRow,
        r#"
        INSERT INTO jobs (id, workflow_id, status, started_at, finished_at, final_output, error_message)
        VALUES ($1, $2, $3, $4, NULL, NULL, NULL)
        RETURNING id, workflow_id, status, started_at, finished_at, final_output, error_message
        "#,
        id,
        workflow_id,
        status,
        now,
    )
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// Promote the oldest pending job for a workflow to `Running`, under the
/// same advisory lock `submit_job` uses. Returns `None` if there is no
/// pending job, or if the running cap is already saturated.
pub async fn promote_next_pending(pool: &PgPool, workflow_id: Uuid, max_running: i64) -> Result<Option<JobRow>, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query!("SELECT pg_advisory_xact_lock($1)", advisory_key(workflow_id))
        .execute(&mut *tx)
        .await?;

    let running_count: i64 = sqlx::query_scalar!(
        r#"SELECT COUNT(*) as "count!" FROM jobs WHERE workflow_id = $1 AND status = 'running'"#,
        workflow_id,
    )
    .fetch_one(&mut *tx)
    .await?;

    if running_count >= max_running {
        tx.rollback().await?;
        return Ok(None);
    }

    let candidate = sqlx::query_as!(
        JobRow,
        r#"
        SELECT id, workflow_id, status, started_at, finished_at, final_output, error_message
        FROM jobs
        WHERE workflow_id = $1 AND status = 'pending'
        ORDER BY started_at ASC
        LIMIT 1
        FOR UPDATE SKIP LOCKED
        "#,
        workflow_id,
    )
    .fetch_optional(&mut *tx)
    .await?;

    let Some(job) = candidate else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query!("UPDATE jobs SET status = 'running' WHERE id = $1", job.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Some(JobRow { status: "running".to_string(), ..job }))
}

pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<JobRow, DbError> {
    let row = sqlx::query_as!(
        JobRow,
        r#"SELECT id, workflow_id, status, started_at, finished_at, final_output, error_message FROM jobs WHERE id = $1"#,
        id,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

pub async fn list_jobs(pool: &PgPool, workflow_id: Uuid) -> Result<Vec<JobRow>, DbError> {
    let rows = sqlx::query_as!(
        JobRow,
        r#"
        SELECT id, workflow_id, status, started_at, finished_at, final_output, error_message
        FROM jobs
        WHERE workflow_id = $1
        ORDER BY started_at DESC
        "#,
        workflow_id,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Terminate a job (spec §4.5 step 3/4): set its final status and
/// `finished_at`. `final_output` is set on success, `error_message` on
/// failure.
pub async fn finish_job(
    pool: &PgPool,
    job_id: Uuid,
    status: &str,
    final_output: Option<&str>,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query!(
        r#"
        UPDATE jobs
        SET status = $1, finished_at = $2, final_output = $3, error_message = $4
        WHERE id = $5
        "#,
        status,
        Utc::now(),
        final_output,
        error_message,
        job_id,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn running_count(pool: &PgPool, workflow_id: Uuid) -> Result<i64, DbError> {
    let count = sqlx::query_scalar!(
        r#"SELECT COUNT(*) as "count!" FROM jobs WHERE workflow_id = $1 AND status = 'running'"#,
        workflow_id,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

pub async fn pending_count(pool: &PgPool, workflow_id: Uuid) -> Result<i64, DbError> {
    let count = sqlx::query_scalar!(
        r#"SELECT COUNT(*) as "count!" FROM jobs WHERE workflow_id = $1 AND status = 'pending'"#,
        workflow_id,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Sweep jobs left `Running`/`Pending` by a coordinator that crashed or was
/// killed (spec §4.6: "on restart ... swept to Failed with
/// error_message = 'interrupted'"). `older_than` is the staleness cutoff.
pub async fn sweep_stale_jobs(pool: &PgPool, older_than: chrono::DateTime<Utc>) -> Result<u64, DbError> {
    let result = sqlx::query!(
        r#"
        UPDATE jobs
        SET status = 'failed', finished_at = $1, error_message = 'interrupted'
        WHERE status IN ('running', 'pending') AND started_at < $2
        "#,
        Utc::now(),
        older_than,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
