//! Workflow/Node/Edge endpoints (spec §6).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use core::{Edge, FlowError, Node, NodeType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

fn parse_node_type(raw: &str) -> Result<NodeType, FlowError> {
    match raw {
        "extract_text" => Ok(NodeType::ExtractText),
        "generative_ai" => Ok(NodeType::GenerativeAi),
        "formatter" => Ok(NodeType::Formatter),
        "agent" => Ok(NodeType::Agent),
        other => Err(FlowError::Validation(format!("unknown node type '{other}'"))),
    }
}

#[derive(Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct WorkflowResponse {
    pub id: Uuid,
    pub name: String,
}

pub async fn create_workflow(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkflowRequest>,
) -> Result<(StatusCode, Json<WorkflowResponse>), ApiError> {
    let workflow = state.repository.create_workflow(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(WorkflowResponse { id: workflow.id, name: workflow.name })))
}

#[derive(Serialize)]
pub struct WorkflowDetailResponse {
    pub id: Uuid,
    pub name: String,
    pub nodes: Vec<Node>,
}

pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowDetailResponse>, ApiError> {
    let workflow = state.repository.get_workflow(id).await?;
    let nodes = state.repository.list_nodes(id).await?;
    Ok(Json(WorkflowDetailResponse { id: workflow.id, name: workflow.name, nodes }))
}

#[derive(Deserialize)]
pub struct CreateNodeRequest {
    pub node_type: String,
    pub config: Value,
}

#[derive(Serialize)]
pub struct CreateNodeResponse {
    pub message: String,
    pub node_id: Uuid,
}

/// Validated both here (node-creation time) and again by
/// `RunCoordinator` at dispatch (snapshot time), per spec §4.3.
pub async fn create_node(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
    Json(payload): Json<CreateNodeRequest>,
) -> Result<(StatusCode, Json<CreateNodeResponse>), ApiError> {
    state.repository.get_workflow(workflow_id).await?;

    let node_type = parse_node_type(&payload.node_type)?;
    nodes::validate_config(node_type, &payload.config)?;

    let order_index = state.repository.next_order_index(workflow_id).await?;
    let node = state.repository.create_node(workflow_id, node_type, payload.config, order_index).await?;

    Ok((StatusCode::CREATED, Json(CreateNodeResponse { message: "node created".into(), node_id: node.id })))
}

fn default_port() -> String {
    "default".into()
}

#[derive(Deserialize)]
pub struct CreateEdgeRequest {
    pub from_node_id: Uuid,
    pub to_node_id: Uuid,
    #[serde(default = "default_port")]
    pub from_port: String,
    #[serde(default = "default_port")]
    pub to_port: String,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Serialize)]
pub struct CreateEdgeResponse {
    pub message: String,
    pub edge_id: Uuid,
}

/// Inserting an edge that would create a cycle fails atomically (spec §3
/// invariant 1, §8 scenario S3): the candidate edge is validated against
/// the existing set before anything is persisted.
pub async fn create_edge(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
    Json(payload): Json<CreateEdgeRequest>,
) -> Result<(StatusCode, Json<CreateEdgeResponse>), ApiError> {
    state.repository.get_workflow(workflow_id).await?;

    let known_nodes = state.repository.list_nodes(workflow_id).await?;
    let mut candidate_edges = state.repository.list_edges(workflow_id).await?;
    candidate_edges.push(Edge {
        id: Uuid::new_v4(),
        workflow_id,
        from_node_id: payload.from_node_id,
        to_node_id: payload.to_node_id,
        from_port: payload.from_port.clone(),
        to_port: payload.to_port.clone(),
        condition: payload.condition.clone(),
    });

    graph::validate_dag(&known_nodes, &candidate_edges).map_err(|e| FlowError::Validation(e.to_string()))?;

    let edge = state
        .repository
        .create_edge(
            workflow_id,
            payload.from_node_id,
            payload.to_node_id,
            &payload.from_port,
            &payload.to_port,
            payload.condition.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreateEdgeResponse { message: "edge created".into(), edge_id: edge.id })))
}

#[derive(Serialize)]
pub struct ListEdgesResponse {
    pub edges: Vec<Edge>,
}

pub async fn list_edges(
    State(state): State<AppState>,
    Path(workflow_id): Path<Uuid>,
) -> Result<Json<ListEdgesResponse>, ApiError> {
    state.repository.get_workflow(workflow_id).await?;
    let edges = state.repository.list_edges(workflow_id).await?;
    Ok(Json(ListEdgesResponse { edges }))
}
