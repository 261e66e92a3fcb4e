//! Run/Job endpoints (spec §6).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use core::{Job, JobStatus};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub status: String,
    pub final_output: Option<String>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            workflow_id: job.workflow_id,
            status: job.status.to_string(),
            final_output: job.final_output,
            error_message: job.error_message,
            started_at: job.started_at,
            finished_at: job.finished_at,
        }
    }
}

#[derive(Serialize)]
pub struct RunResponse {
    pub message: String,
    pub job_id: Uuid,
    pub status: String,
}

/// Admission (running vs. queued vs. rejected) is decided by
/// `Scheduler::submit`, not here — this handler only reports the outcome.
pub async fn run_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
) -> Result<(StatusCode, Json<RunResponse>), ApiError> {
    state.repository.get_workflow(workflow_id).await?;

    let job = state.scheduler.submit(workflow_id).await?;
    let message = match job.status {
        JobStatus::Running => "job started",
        JobStatus::Pending => "job queued",
        _ => "job submitted",
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(RunResponse { message: message.into(), job_id: job.id, status: job.status.to_string() }),
    ))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResponse>, ApiError> {
    let job = state.repository.get_job(job_id).await?;
    Ok(Json(job.into()))
}

#[derive(Serialize)]
pub struct RunsResponse {
    pub runs: Vec<JobResponse>,
}

pub async fn list_runs(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
) -> Result<Json<RunsResponse>, ApiError> {
    state.repository.get_workflow(workflow_id).await?;
    let jobs = state.repository.list_jobs(workflow_id).await?;
    Ok(Json(RunsResponse { runs: jobs.into_iter().map(Into::into).collect() }))
}
