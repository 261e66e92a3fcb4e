//! `graph` crate — DAG validation and batched topological scheduling (C1).
//!
//! Direct generalization of the teacher's `engine::dag::validate_dag`: Kahn's
//! algorithm still drives both validation and ordering, but instead of
//! returning one flat sorted `Vec`, [`topological_batches`] groups nodes into
//! layers so the run coordinator can dispatch an entire layer concurrently.

pub mod error;

use std::collections::{HashMap, HashSet, VecDeque};

use core::{Edge, Node};
use uuid::Uuid;

pub use error::GraphError;

/// A maximal set of nodes whose upstream dependencies all live in strictly
/// earlier batches. Node ids within a batch are sorted alphabetically (by
/// string form) for deterministic tiebreaking during input aggregation.
pub type Batch = Vec<Uuid>;

/// Verify the workflow's edge set is well-formed and acyclic (spec §4.1):
/// every edge refers to existing nodes in the same workflow, there are no
/// duplicate edges with identical endpoints+ports, and the induced subgraph
/// is acyclic.
pub fn validate_dag(nodes: &[Node], edges: &[Edge]) -> Result<(), GraphError> {
    let workflow_of: HashMap<Uuid, Uuid> = nodes.iter().map(|n| (n.id, n.workflow_id)).collect();

    for edge in edges {
        let from_wf = workflow_of.get(&edge.from_node_id).ok_or(GraphError::UnknownNodeReference {
            node_id: edge.from_node_id,
            side: "from",
        })?;
        let to_wf = workflow_of.get(&edge.to_node_id).ok_or(GraphError::UnknownNodeReference {
            node_id: edge.to_node_id,
            side: "to",
        })?;
        if from_wf != to_wf {
            return Err(GraphError::CrossWorkflowEdge {
                edge_id: edge.id,
                from_workflow: *from_wf,
                to_workflow: *to_wf,
            });
        }
    }

    let mut seen_edges: HashSet<(Uuid, Uuid, &str, &str)> = HashSet::new();
    for edge in edges {
        let key = (edge.from_node_id, edge.to_node_id, edge.from_port.as_str(), edge.to_port.as_str());
        if !seen_edges.insert(key) {
            return Err(GraphError::DuplicateEdge {
                from: edge.from_node_id,
                to: edge.to_node_id,
                from_port: edge.from_port.clone(),
                to_port: edge.to_port.clone(),
            });
        }
    }

    // Acyclicity falls out of a successful batching pass.
    topological_batches(nodes, edges)?;
    Ok(())
}

/// Compute the ordered list of dependency batches (spec §4.1). Runs in
/// `O(V + E)`. If `edges` is empty, falls back to a single linear batch
/// sorted by `order_index` then `created_at` (spec's backward-compatibility
/// rule for workflows built before edges existed).
pub fn topological_batches(nodes: &[Node], edges: &[Edge]) -> Result<Vec<Batch>, GraphError> {
    if edges.is_empty() {
        let mut ordered: Vec<&Node> = nodes.iter().collect();
        ordered.sort_by(|a, b| a.order_index.cmp(&b.order_index).then(a.created_at.cmp(&b.created_at)));
        return Ok(vec![ordered.into_iter().map(|n| n.id).collect()]);
    }

    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    let mut in_degree: HashMap<Uuid, usize> = HashMap::new();

    for node in nodes {
        adjacency.entry(node.id).or_default();
        in_degree.entry(node.id).or_insert(0);
    }

    for edge in edges {
        adjacency.entry(edge.from_node_id).or_default().push(edge.to_node_id);
        *in_degree.entry(edge.to_node_id).or_insert(0) += 1;
    }

    let mut batches: Vec<Batch> = Vec::new();
    let mut frontier: VecDeque<Uuid> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut remaining = in_degree.clone();
    let mut visited_count = 0usize;

    while !frontier.is_empty() {
        let mut batch: Vec<Uuid> = frontier.drain(..).collect();
        batch.sort_by_key(|id| id.to_string());
        visited_count += batch.len();

        let mut next_frontier: Vec<Uuid> = Vec::new();
        for node_id in &batch {
            if let Some(neighbours) = adjacency.get(node_id) {
                for &neighbour in neighbours {
                    let deg = remaining.get_mut(&neighbour).expect("neighbour must have an in-degree entry");
                    *deg -= 1;
                    if *deg == 0 {
                        next_frontier.push(neighbour);
                    }
                }
            }
        }

        batches.push(batch);
        frontier = next_frontier.into();
    }

    if visited_count != nodes.len() {
        let unresolved: HashSet<Uuid> = remaining.iter().filter(|(_, &d)| d > 0).map(|(&id, _)| id).collect();
        let witness = find_cycle_witness(&unresolved, &adjacency);
        return Err(GraphError::CycleDetected { witness });
    }

    Ok(batches)
}

/// Ordered (alphabetically by node id) list of a node's direct upstream
/// dependencies, used by the run coordinator's AND-join input aggregation.
pub fn predecessors(node_id: Uuid, edges: &[Edge]) -> Vec<Uuid> {
    let mut preds: Vec<Uuid> = edges
        .iter()
        .filter(|e| e.to_node_id == node_id)
        .map(|e| e.from_node_id)
        .collect();
    preds.sort_by_key(|id| id.to_string());
    preds.dedup();
    preds
}

/// Ids of nodes with no outgoing edge — the workflow's sink set, whose
/// outputs the run coordinator concatenates into `final_output`.
pub fn sinks(nodes: &[Node], edges: &[Edge]) -> Vec<Uuid> {
    let has_outgoing: HashSet<Uuid> = edges.iter().map(|e| e.from_node_id).collect();
    let mut sink_ids: Vec<Uuid> = nodes.iter().map(|n| n.id).filter(|id| !has_outgoing.contains(id)).collect();
    sink_ids.sort_by_key(|id| id.to_string());
    sink_ids
}

/// Walk from the alphabetically-smallest node still stuck with a positive
/// in-degree, following edges that stay inside the stuck set, until a node
/// repeats — that repeated suffix is the cycle.
fn find_cycle_witness(stuck: &HashSet<Uuid>, adjacency: &HashMap<Uuid, Vec<Uuid>>) -> Vec<Uuid> {
    let Some(&start) = stuck.iter().min_by_key(|id| id.to_string()) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut position_of: HashMap<Uuid, usize> = HashMap::from([(start, 0)]);
    let mut current = start;

    loop {
        let next = adjacency
            .get(&current)
            .into_iter()
            .flatten()
            .find(|n| stuck.contains(n));

        let Some(&next) = next else {
            return path;
        };

        if let Some(&pos) = position_of.get(&next) {
            path.push(next);
            return path[pos..].to_vec();
        }

        position_of.insert(next, path.len());
        path.push(next);
        current = next;
    }
}
