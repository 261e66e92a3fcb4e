//! `RunCoordinator` (C5, spec §4.5): drives one admitted Job to completion.
//!
//! Generalizes the teacher's `executor::WorkflowExecutor::run`, which walked
//! a single linear `Vec<NodeDefinition>` with one retry policy for every
//! step. Here `graph::topological_batches` replaces the linear walk with
//! layered batches, each batch is fanned out concurrently with
//! `futures::future::join_all` (the pattern also used by the `graphbit`
//! example's workflow executor), and retries are no longer the
//! coordinator's concern — they live inside the agent runtime and the LLM
//! client's own transport layer, per spec §4.4/§9.

use std::collections::HashMap;
use std::sync::Arc;

use core::{truncate_for_storage, FlowError, JobStatus, Node, NodeType};
use db::{NewJobStep, Repository};
use futures::future::join_all;
use graph::{predecessors, sinks, topological_batches};
use services::Services;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::registry::NodeRegistry;

#[derive(Clone)]
pub struct RunCoordinator {
    repository: Arc<dyn Repository>,
    registry: NodeRegistry,
    services: Services,
}

fn node_type_label(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::ExtractText => "extract_text",
        NodeType::GenerativeAi => "generative_ai",
        NodeType::Formatter => "formatter",
        NodeType::Agent => "agent",
    }
}

impl RunCoordinator {
    pub fn new(repository: Arc<dyn Repository>, registry: NodeRegistry, services: Services) -> Self {
        Self { repository, registry, services }
    }

    /// Run an already-admitted (`Running`) Job to a terminal state (spec
    /// §4.5). The scheduler is responsible for the `Pending -> Running`
    /// transition and `started_at`; by the time this is called those are
    /// already recorded (spec §4.6 "Promote -> Job Running, launch C5").
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn run_job(&self, job_id: Uuid) -> Result<(), FlowError> {
        let job = self.repository.get_job(job_id).await?;
        let nodes = self.repository.list_nodes(job.workflow_id).await?;
        let edges = self.repository.list_edges(job.workflow_id).await?;

        let batches = match topological_batches(&nodes, &edges) {
            Ok(batches) => batches,
            Err(err) => {
                let message = format!("graph error: {err}");
                self.repository.finish_job(job_id, JobStatus::Failed, None, Some(&message)).await?;
                return Err(FlowError::Validation(message));
            }
        };

        let node_by_id: HashMap<Uuid, &Node> = nodes.iter().map(|n| (n.id, n)).collect();
        let mut outputs: HashMap<Uuid, String> = HashMap::new();

        for batch in &batches {
            let dispatches = batch.iter().map(|&node_id| {
                let node = *node_by_id.get(&node_id).expect("batch node must come from the same node list");
                let input_text = self.resolve_input(node_id, &edges, &outputs);
                self.dispatch_node(job_id, node, input_text)
            });

            let results = join_all(dispatches).await;

            let mut first_failure: Option<(Uuid, FlowError)> = None;
            for (&node_id, outcome) in batch.iter().zip(results.into_iter()) {
                match outcome {
                    Ok(output) => {
                        outputs.insert(node_id, output);
                    }
                    Err(err) => {
                        if first_failure.is_none() {
                            first_failure = Some((node_id, err));
                        }
                    }
                }
            }

            if let Some((node_id, err)) = first_failure {
                let message = format!("{node_id}: {err}");
                warn!(%node_id, %err, "job step failed, aborting remaining batches");
                self.repository.finish_job(job_id, JobStatus::Failed, None, Some(&message)).await?;
                return Err(err);
            }
        }

        let sink_ids = sinks(&nodes, &edges);
        let final_output = sink_ids
            .iter()
            .map(|id| outputs.get(id).map(String::as_str).unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n\n");

        self.repository.finish_job(job_id, JobStatus::Succeeded, Some(&final_output), None).await?;
        info!("job succeeded");
        Ok(())
    }

    /// AND-join input aggregation (spec §4.5): predecessors sorted
    /// alphabetically by node id, joined on a blank line. A node with no
    /// predecessors starts from an empty `input_text`.
    fn resolve_input(&self, node_id: Uuid, edges: &[core::Edge], outputs: &HashMap<Uuid, String>) -> String {
        let preds = predecessors(node_id, edges);
        if preds.is_empty() {
            return String::new();
        }
        preds
            .iter()
            .map(|p| outputs.get(p).map(String::as_str).unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    async fn dispatch_node(&self, job_id: Uuid, node: &Node, input_text: String) -> Result<String, FlowError> {
        let started_at = self.services.clock.now();
        let step = self
            .repository
            .insert_job_step(NewJobStep {
                job_id,
                node_id: Some(node.id),
                node_type: node_type_label(node.node_type),
                started_at,
                input_text: truncate_for_storage(&input_text),
                config_snapshot: node.config.clone(),
            })
            .await?;

        let executor = self.registry.resolve(node.node_type);
        let outcome = executor.execute(&node.config, &input_text, &self.services).await;

        match &outcome {
            Ok(output) => {
                self.repository
                    .finish_job_step(step.id, JobStatus::Succeeded, Some(&truncate_for_storage(output)), None)
                    .await?;
            }
            Err(err) => {
                self.repository
                    .finish_job_step(step.id, JobStatus::Failed, None, Some(&err.to_string()))
                    .await?;
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use core::{Edge, Job, JobStep, UploadedFile, Workflow};
    use serde_json::json;
    use services::{FileStore, LlmClient, LlmRequest, LlmResponse, LoadedFile, ServiceError, SystemClock};
    use std::sync::Mutex;

    struct UnreachableLlm;
    #[async_trait]
    impl LlmClient for UnreachableLlm {
        async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse, ServiceError> {
            panic!("test workflow never calls the LLM")
        }
    }

    struct UnreachableFiles;
    #[async_trait]
    impl FileStore for UnreachableFiles {
        async fn load(&self, _file_id: Uuid) -> Result<LoadedFile, ServiceError> {
            panic!("test workflow never loads files")
        }
    }

    fn services() -> Services {
        Services::new(Arc::new(UnreachableLlm), Arc::new(UnreachableFiles), Arc::new(SystemClock))
    }

    fn make_node(workflow_id: Uuid, rules: serde_json::Value, order_index: i32) -> Node {
        Node {
            id: Uuid::new_v4(),
            workflow_id,
            node_type: NodeType::Formatter,
            config: rules,
            order_index,
            created_at: Utc::now(),
        }
    }

    /// An in-memory `Repository` used only to exercise `RunCoordinator`
    /// without a database, mirroring the teacher's in-memory test doubles
    /// for `executor_tests.rs`.
    struct FakeRepository {
        workflow_id: Uuid,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        job: Mutex<Job>,
        steps: Mutex<Vec<JobStep>>,
    }

    #[async_trait]
    impl Repository for FakeRepository {
        async fn create_workflow(&self, _name: &str) -> Result<Workflow, db::DbError> {
            unimplemented!()
        }
        async fn get_workflow(&self, _id: Uuid) -> Result<Workflow, db::DbError> {
            unimplemented!()
        }
        async fn create_node(
            &self,
            _workflow_id: Uuid,
            _node_type: NodeType,
            _config: serde_json::Value,
            _order_index: i32,
        ) -> Result<Node, db::DbError> {
            unimplemented!()
        }
        async fn get_node(&self, _id: Uuid) -> Result<Node, db::DbError> {
            unimplemented!()
        }
        async fn list_nodes(&self, workflow_id: Uuid) -> Result<Vec<Node>, db::DbError> {
            assert_eq!(workflow_id, self.workflow_id);
            Ok(self.nodes.clone())
        }
        async fn next_order_index(&self, _workflow_id: Uuid) -> Result<i32, db::DbError> {
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
        ) -> Result<Edge, db::DbError> {
            unimplemented!()
        }
        async fn list_edges(&self, workflow_id: Uuid) -> Result<Vec<Edge>, db::DbError> {
            assert_eq!(workflow_id, self.workflow_id);
            Ok(self.edges.clone())
        }
        async fn submit_job(&self, _workflow_id: Uuid, _max_running: i64, _max_pending: i64) -> Result<Job, db::DbError> {
            unimplemented!()
        }
        async fn promote_next_pending(&self, _workflow_id: Uuid, _max_running: i64) -> Result<Option<Job>, db::DbError> {
            unimplemented!()
        }
        async fn get_job(&self, id: Uuid) -> Result<Job, db::DbError> {
            let job = self.job.lock().unwrap();
            assert_eq!(job.id, id);
            Ok(job.clone())
        }
        async fn list_jobs(&self, _workflow_id: Uuid) -> Result<Vec<Job>, db::DbError> {
            unimplemented!()
        }
        async fn get_job_with_steps(&self, _job_id: Uuid) -> Result<(Job, Vec<JobStep>), db::DbError> {
            unimplemented!()
        }
        async fn finish_job(
            &self,
            job_id: Uuid,
            status: JobStatus,
            final_output: Option<&str>,
            error_message: Option<&str>,
        ) -> Result<(), db::DbError> {
            let mut job = self.job.lock().unwrap();
            assert_eq!(job.id, job_id);
            job.status = status;
            job.finished_at = Some(Utc::now());
            job.final_output = final_output.map(String::from);
            job.error_message = error_message.map(String::from);
            Ok(())
        }
        async fn running_count(&self, _workflow_id: Uuid) -> Result<i64, db::DbError> {
            unimplemented!()
        }
        async fn pending_count(&self, _workflow_id: Uuid) -> Result<i64, db::DbError> {
            unimplemented!()
        }
        async fn sweep_stale_jobs(&self, _older_than: DateTime<Utc>) -> Result<u64, db::DbError> {
            unimplemented!()
        }
        async fn insert_job_step(&self, step: NewJobStep) -> Result<JobStep, db::DbError> {
            let record = JobStep {
                id: Uuid::new_v4(),
                job_id: step.job_id,
                node_id: step.node_id,
                node_type: self.nodes.iter().find(|n| Some(n.id) == step.node_id).unwrap().node_type,
                status: JobStatus::Running,
                started_at: step.started_at,
                finished_at: None,
                input_text: Some(step.input_text),
                output_text: None,
                error_message: None,
                config_snapshot: step.config_snapshot,
            };
            self.steps.lock().unwrap().push(record.clone());
            Ok(record)
        }
        async fn finish_job_step(
            &self,
            step_id: Uuid,
            status: JobStatus,
            output_text: Option<&str>,
            error_message: Option<&str>,
        ) -> Result<(), db::DbError> {
            let mut steps = self.steps.lock().unwrap();
            let step = steps.iter_mut().find(|s| s.id == step_id).unwrap();
            step.status = status;
            step.finished_at = Some(Utc::now());
            step.output_text = output_text.map(String::from);
            step.error_message = error_message.map(String::from);
            Ok(())
        }
        async fn create_uploaded_file(
            &self,
            _id: Uuid,
            _filename: &str,
            _mime_type: &str,
            _size_bytes: i64,
            _path: &str,
        ) -> Result<UploadedFile, db::DbError> {
            unimplemented!()
        }
        async fn get_uploaded_file(&self, _id: Uuid) -> Result<UploadedFile, db::DbError> {
            unimplemented!()
        }
    }

    fn edge(workflow_id: Uuid, from: Uuid, to: Uuid) -> Edge {
        Edge {
            id: Uuid::new_v4(),
            workflow_id,
            from_node_id: from,
            to_node_id: to,
            from_port: "out".into(),
            to_port: "in".into(),
            condition: None,
        }
    }

    fn job(workflow_id: Uuid) -> Job {
        Job {
            id: Uuid::new_v4(),
            workflow_id,
            status: JobStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            final_output: None,
            error_message: None,
        }
    }

    #[tokio::test]
    async fn linear_chain_succeeds_and_sets_final_output() {
        let workflow_id = Uuid::new_v4();
        let a = make_node(workflow_id, json!({ "rules": ["uppercase"] }), 0);
        let b = make_node(workflow_id, json!({ "rules": ["lowercase"] }), 1);
        let edges = vec![edge(workflow_id, a.id, b.id)];
        let job_row = job(workflow_id);
        let job_id = job_row.id;

        let repo = Arc::new(FakeRepository {
            workflow_id,
            nodes: vec![a.clone(), b.clone()],
            edges,
            job: Mutex::new(job_row),
            steps: Mutex::new(Vec::new()),
        });

        let coordinator = RunCoordinator::new(repo.clone(), NodeRegistry::new(), services());
        coordinator.run_job(job_id).await.unwrap();

        let finished = repo.job.lock().unwrap().clone();
        assert_eq!(finished.status, JobStatus::Succeeded);
        assert_eq!(finished.final_output.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn diamond_and_join_concatenates_alphabetically() {
        let workflow_id = Uuid::new_v4();
        let a = make_node(workflow_id, json!({ "rules": [] }), 0);
        let b = make_node(workflow_id, json!({ "rules": ["uppercase"] }), 1);
        let c = make_node(workflow_id, json!({ "rules": ["lowercase"] }), 2);
        let d = make_node(workflow_id, json!({ "rules": [] }), 3);
        let edges = vec![
            edge(workflow_id, a.id, b.id),
            edge(workflow_id, a.id, c.id),
            edge(workflow_id, b.id, d.id),
            edge(workflow_id, c.id, d.id),
        ];
        let job_row = job(workflow_id);
        let job_id = job_row.id;

        let repo = Arc::new(FakeRepository {
            workflow_id,
            nodes: vec![a.clone(), b.clone(), c.clone(), d.clone()],
            edges,
            job: Mutex::new(job_row),
            steps: Mutex::new(Vec::new()),
        });

        let coordinator = RunCoordinator::new(repo.clone(), NodeRegistry::new(), services());
        coordinator.run_job(job_id).await.unwrap();

        let finished = repo.job.lock().unwrap().clone();
        assert_eq!(finished.status, JobStatus::Succeeded);
        assert_eq!(finished.final_output.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn failing_node_fails_the_job_fast() {
        let workflow_id = Uuid::new_v4();
        let a = make_node(workflow_id, json!({ "rules": ["reticulate"] }), 0);
        let job_row = job(workflow_id);
        let job_id = job_row.id;

        let repo = Arc::new(FakeRepository {
            workflow_id,
            nodes: vec![a.clone()],
            edges: Vec::new(),
            job: Mutex::new(job_row),
            steps: Mutex::new(Vec::new()),
        });

        let coordinator = RunCoordinator::new(repo.clone(), NodeRegistry::new(), services());
        let err = coordinator.run_job(job_id).await.unwrap_err();
        assert!(matches!(err, FlowError::Validation(_)));

        let finished = repo.job.lock().unwrap().clone();
        assert_eq!(finished.status, JobStatus::Failed);
        assert!(finished.error_message.unwrap().contains(&a.id.to_string()));
    }

    #[tokio::test]
    async fn cyclic_workflow_is_rejected_before_dispatch() {
        let workflow_id = Uuid::new_v4();
        let a = make_node(workflow_id, json!({ "rules": [] }), 0);
        let b = make_node(workflow_id, json!({ "rules": [] }), 1);
        let edges = vec![edge(workflow_id, a.id, b.id), edge(workflow_id, b.id, a.id)];
        let job_row = job(workflow_id);
        let job_id = job_row.id;

        let repo = Arc::new(FakeRepository {
            workflow_id,
            nodes: vec![a.clone(), b.clone()],
            edges,
            job: Mutex::new(job_row),
            steps: Mutex::new(Vec::new()),
        });

        let coordinator = RunCoordinator::new(repo.clone(), NodeRegistry::new(), services());
        let err = coordinator.run_job(job_id).await.unwrap_err();
        assert!(matches!(err, FlowError::Validation(_)));
        assert!(repo.steps.lock().unwrap().is_empty());
    }
}
