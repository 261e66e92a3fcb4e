//! Job Scheduler (C4, spec §4.6): per-workflow admission, FIFO promotion,
//! and the stale-job sweep run at coordinator restart.
//!
//! Generalizes the teacher's single global queue (`fetch_next_job` via
//! `SELECT ... FOR UPDATE SKIP LOCKED`) into a per-workflow admission policy
//! — the `FOR UPDATE SKIP LOCKED` promotion query itself lives in
//! `db::repository::jobs::promote_next_pending`, kept from the teacher.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use core::{FlowError, Job, JobStatus};
use db::Repository;
use engine::RunCoordinator;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::SchedulerConfig;

#[derive(Clone)]
pub struct Scheduler {
    repository: Arc<dyn Repository>,
    coordinator: RunCoordinator,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(repository: Arc<dyn Repository>, coordinator: RunCoordinator, config: SchedulerConfig) -> Self {
        Self { repository, coordinator, config }
    }

    /// Submit → insert Job `Pending`, attempt immediate promotion (spec
    /// §4.6). Admission itself (pending/running caps, `QueueFull`) is
    /// decided transactionally inside `Repository::submit_job`; this just
    /// launches the coordinator when the insert came back `Running`.
    #[instrument(skip(self))]
    pub async fn submit(&self, workflow_id: Uuid) -> Result<Job, FlowError> {
        let job = self
            .repository
            .submit_job(workflow_id, self.config.max_running, self.config.max_pending)
            .await?;

        if job.status == JobStatus::Running {
            self.spawn_run(job.id, workflow_id);
        }

        Ok(job)
    }

    fn spawn_run(&self, job_id: Uuid, workflow_id: Uuid) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            match scheduler.coordinator.run_job(job_id).await {
                Ok(()) => info!(%job_id, "job run ended in success"),
                Err(err) => warn!(%job_id, %err, "job run ended in failure"),
            }
            scheduler.promote_next(workflow_id).await;
        });
    }

    /// Terminate (success or failure) → trigger promotion pass (spec §4.6).
    /// Errors are logged, not propagated: this runs detached from any
    /// request and has no caller left to report to.
    #[instrument(skip(self))]
    pub async fn promote_next(&self, workflow_id: Uuid) {
        match self.repository.promote_next_pending(workflow_id, self.config.max_running).await {
            Ok(Some(job)) => self.spawn_run(job.id, workflow_id),
            Ok(None) => {}
            Err(err) => error!(%workflow_id, %err, "failed to promote next pending job"),
        }
    }

    /// On restart, sweep Jobs left `Running`/`Pending` older than
    /// `staleness` to `Failed` with `error_message = "interrupted"` (spec
    /// §4.6 "Failure of the coordinator itself"). Run once at `cli serve`
    /// / `cli worker` startup.
    pub async fn sweep_stale_jobs(&self, staleness: Duration) -> Result<u64, FlowError> {
        let staleness = chrono::Duration::from_std(staleness).map_err(|e| FlowError::Internal(e.to_string()))?;
        let older_than = Utc::now() - staleness;
        Ok(self.repository.sweep_stale_jobs(older_than).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use core::{Edge, JobStep, Node, NodeType, UploadedFile, Workflow};
    use db::{DbError, NewJobStep};
    use services::{FileStore, LlmClient, LlmRequest, LlmResponse, LoadedFile, ServiceError, Services, SystemClock};
    use std::sync::Mutex;

    struct UnreachableLlm;
    #[async_trait]
    impl LlmClient for UnreachableLlm {
        async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse, ServiceError> {
            panic!("fixture workflow never calls the LLM")
        }
    }

    struct UnreachableFiles;
    #[async_trait]
    impl FileStore for UnreachableFiles {
        async fn load(&self, _file_id: Uuid) -> Result<LoadedFile, ServiceError> {
            panic!("fixture workflow never loads files")
        }
    }

    fn services() -> Services {
        Services::new(Arc::new(UnreachableLlm), Arc::new(UnreachableFiles), Arc::new(SystemClock))
    }

    /// In-memory stand-in for `PgRepository` that reproduces the admission
    /// semantics of `db::repository::jobs` (FIFO pending queue, per-workflow
    /// running cap) without a database. The fixture workflow has no nodes,
    /// so `RunCoordinator::run_job` completes immediately.
    struct FakeRepository {
        workflow_id: Uuid,
        jobs: Mutex<Vec<Job>>,
    }

    impl FakeRepository {
        fn new(workflow_id: Uuid) -> Self {
            Self { workflow_id, jobs: Mutex::new(Vec::new()) }
        }

        fn seed(&self, status: JobStatus) -> Uuid {
            let job = Job {
                id: Uuid::new_v4(),
                workflow_id: self.workflow_id,
                status,
                started_at: Utc::now(),
                finished_at: None,
                final_output: None,
                error_message: None,
            };
            let id = job.id;
            self.jobs.lock().unwrap().push(job);
            id
        }
    }

    #[async_trait]
    impl Repository for FakeRepository {
        async fn create_workflow(&self, _name: &str) -> Result<Workflow, DbError> {
            unimplemented!()
        }
        async fn get_workflow(&self, _id: Uuid) -> Result<Workflow, DbError> {
            unimplemented!()
        }
        async fn create_node(
            &self,
            _workflow_id: Uuid,
            _node_type: NodeType,
            _config: serde_json::Value,
            _order_index: i32,
        ) -> Result<Node, DbError> {
            unimplemented!()
        }
        async fn get_node(&self, _id: Uuid) -> Result<Node, DbError> {
            unimplemented!()
        }
        async fn list_nodes(&self, workflow_id: Uuid) -> Result<Vec<Node>, DbError> {
            assert_eq!(workflow_id, self.workflow_id);
            Ok(Vec::new())
        }
        async fn next_order_index(&self, _workflow_id: Uuid) -> Result<i32, DbError> {
            unimplemented!()
        }
        async fn create_edge(
            &self,
            _workflow_id: Uuid,
            _from_node_id: Uuid,
            _to_node_id: Uuid,
            _from_port: &str,
            _to_port: &str,
            _condition: Option<&str>,
        ) -> Result<Edge, DbError> {
            unimplemented!()
        }
        async fn list_edges(&self, workflow_id: Uuid) -> Result<Vec<Edge>, DbError> {
            assert_eq!(workflow_id, self.workflow_id);
            Ok(Vec::new())
        }
        async fn submit_job(&self, workflow_id: Uuid, max_running: i64, max_pending: i64) -> Result<Job, DbError> {
            let mut jobs = self.jobs.lock().unwrap();
            let pending = jobs.iter().filter(|j| j.status == JobStatus::Pending).count() as i64;
            if pending >= max_pending {
                return Err(DbError::QueueFull);
            }
            let running = jobs.iter().filter(|j| j.status == JobStatus::Running).count() as i64;
            let status = if running < max_running { JobStatus::Running } else { JobStatus::Pending };
            let job = Job {
                id: Uuid::new_v4(),
                workflow_id,
                status,
                started_at: Utc::now(),
                finished_at: None,
                final_output: None,
                error_message: None,
            };
            jobs.push(job.clone());
            Ok(job)
        }
        async fn promote_next_pending(&self, _workflow_id: Uuid, max_running: i64) -> Result<Option<Job>, DbError> {
            let mut jobs = self.jobs.lock().unwrap();
            let running = jobs.iter().filter(|j| j.status == JobStatus::Running).count() as i64;
            if running >= max_running {
                return Ok(None);
            }
            match jobs.iter().position(|j| j.status == JobStatus::Pending) {
                Some(idx) => {
                    jobs[idx].status = JobStatus::Running;
                    Ok(Some(jobs[idx].clone()))
                }
                None => Ok(None),
            }
        }
        async fn get_job(&self, id: Uuid) -> Result<Job, DbError> {
            self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned().ok_or(DbError::NotFound)
        }
        async fn list_jobs(&self, _workflow_id: Uuid) -> Result<Vec<Job>, DbError> {
            unimplemented!()
        }
        async fn get_job_with_steps(&self, _job_id: Uuid) -> Result<(Job, Vec<JobStep>), DbError> {
            unimplemented!()
        }
        async fn finish_job(
            &self,
            job_id: Uuid,
            status: JobStatus,
            final_output: Option<&str>,
            error_message: Option<&str>,
        ) -> Result<(), DbError> {
            let mut jobs = self.jobs.lock().unwrap();
            let job = jobs.iter_mut().find(|j| j.id == job_id).unwrap();
            job.status = status;
            job.finished_at = Some(Utc::now());
            job.final_output = final_output.map(String::from);
            job.error_message = error_message.map(String::from);
            Ok(())
        }
        async fn running_count(&self, workflow_id: Uuid) -> Result<i64, DbError> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .iter()
                .filter(|j| j.workflow_id == workflow_id && j.status == JobStatus::Running)
                .count() as i64)
        }
        async fn pending_count(&self, workflow_id: Uuid) -> Result<i64, DbError> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .iter()
                .filter(|j| j.workflow_id == workflow_id && j.status == JobStatus::Pending)
                .count() as i64)
        }
        async fn sweep_stale_jobs(&self, older_than: DateTime<Utc>) -> Result<u64, DbError> {
            let mut jobs = self.jobs.lock().unwrap();
            let mut count = 0u64;
            for job in jobs.iter_mut() {
                if !job.status.is_terminal() && job.started_at < older_than {
                    job.status = JobStatus::Failed;
                    job.finished_at = Some(Utc::now());
                    job.error_message = Some("interrupted".into());
                    count += 1;
                }
            }
            Ok(count)
        }
        async fn insert_job_step(&self, _step: NewJobStep) -> Result<JobStep, DbError> {
            unimplemented!("fixture workflow has no nodes to dispatch")
        }
        async fn finish_job_step(
            &self,
            _step_id: Uuid,
            _status: JobStatus,
            _output_text: Option<&str>,
            _error_message: Option<&str>,
        ) -> Result<(), DbError> {
            unimplemented!()
        }
        async fn create_uploaded_file(
            &self,
            _id: Uuid,
            _filename: &str,
            _mime_type: &str,
            _size_bytes: i64,
            _path: &str,
        ) -> Result<UploadedFile, DbError> {
            unimplemented!()
        }
        async fn get_uploaded_file(&self, _id: Uuid) -> Result<UploadedFile, DbError> {
            unimplemented!()
        }
    }

    fn scheduler_with(workflow_id: Uuid, config: SchedulerConfig) -> (Scheduler, Arc<FakeRepository>) {
        let repo = Arc::new(FakeRepository::new(workflow_id));
        let coordinator = RunCoordinator::new(repo.clone(), engine::NodeRegistry::new(), services());
        (Scheduler::new(repo.clone(), coordinator, config), repo)
    }

    #[tokio::test]
    async fn submit_runs_immediately_under_the_running_cap() {
        let workflow_id = Uuid::new_v4();
        let (scheduler, _repo) = scheduler_with(workflow_id, SchedulerConfig { max_running: 1, max_pending: 2 });

        let job = scheduler.submit(workflow_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
    }

    #[tokio::test]
    async fn submit_queues_beyond_the_running_cap() {
        let workflow_id = Uuid::new_v4();
        let (scheduler, repo) = scheduler_with(workflow_id, SchedulerConfig { max_running: 1, max_pending: 2 });
        repo.seed(JobStatus::Running);

        let job = scheduler.submit(workflow_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn submit_beyond_both_caps_is_rejected() {
        let workflow_id = Uuid::new_v4();
        let (scheduler, repo) = scheduler_with(workflow_id, SchedulerConfig { max_running: 1, max_pending: 1 });
        repo.seed(JobStatus::Running);
        repo.seed(JobStatus::Pending);

        let err = scheduler.submit(workflow_id).await.unwrap_err();
        assert!(matches!(err, FlowError::QueueFull));
    }

    #[tokio::test]
    async fn promote_next_picks_the_oldest_pending_job() {
        let workflow_id = Uuid::new_v4();
        let (scheduler, repo) = scheduler_with(workflow_id, SchedulerConfig { max_running: 1, max_pending: 5 });
        let first_pending = repo.seed(JobStatus::Pending);
        repo.seed(JobStatus::Pending);

        scheduler.promote_next(workflow_id).await;

        let promoted = repo.get_job(first_pending).await.unwrap();
        assert_eq!(promoted.status, JobStatus::Running);
    }

    #[tokio::test]
    async fn promote_next_is_a_no_op_when_nothing_is_pending() {
        let workflow_id = Uuid::new_v4();
        let (scheduler, _repo) = scheduler_with(workflow_id, SchedulerConfig::default());
        scheduler.promote_next(workflow_id).await;
    }

    #[tokio::test]
    async fn sweep_marks_stale_jobs_failed() {
        let workflow_id = Uuid::new_v4();
        let (scheduler, repo) = scheduler_with(workflow_id, SchedulerConfig::default());
        let stale_id = repo.seed(JobStatus::Running);
        repo.jobs.lock().unwrap().iter_mut().find(|j| j.id == stale_id).unwrap().started_at =
            Utc::now() - chrono::Duration::hours(2);

        let swept = scheduler.sweep_stale_jobs(Duration::from_secs(3600)).await.unwrap();
        assert_eq!(swept, 1);

        let job = repo.get_job(stale_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("interrupted"));
    }
}
