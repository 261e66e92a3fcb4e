//! Node CRUD operations (spec §3/§4.3: `config` validated by the `nodes`
//! crate before this is called; this layer only persists).

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::NodeRow, DbError};

pub async fn create_node(
    pool: &PgPool,
    workflow_id: Uuid,
    node_type: &str,
    config: serde_json::Value,
    order_index: i32,
) -> Result<NodeRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as!(
        NodeRow,
        r#"
        INSERT INTO nodes (id, workflow_id, node_type, config, order_index, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, workflow_id, node_type, config, order_index, created_at
        "#,
        id,
        workflow_id,
        node_type,
        config,
        order_index,
        now,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_node(pool: &PgPool, id: Uuid) -> Result<NodeRow, DbError> {
    let row = sqlx::query_as!(
        NodeRow,
        r#"SELECT id, workflow_id, node_type, config, order_index, created_at FROM nodes WHERE id = $1"#,
        id,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Consistent snapshot of a workflow's nodes (spec §4.7), ordered by
/// `order_index` then `created_at` to match the linear-fallback tiebreak.
pub async fn list_nodes(pool: &PgPool, workflow_id: Uuid) -> Result<Vec<NodeRow>, DbError> {
    let rows = sqlx::query_as!(
        NodeRow,
        r#"
        SELECT id, workflow_id, node_type, config, order_index, created_at
        FROM nodes
        WHERE workflow_id = $1
        ORDER BY order_index ASC, created_at ASC
        "#,
        workflow_id,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Highest `order_index` currently used by the workflow, for appending new
/// nodes at the end of the linear-fallback order.
pub async fn next_order_index(pool: &PgPool, workflow_id: Uuid) -> Result<i32, DbError> {
    let max: Option<i32> = sqlx::query_scalar!(
        r#"SELECT MAX(order_index) FROM nodes WHERE workflow_id = $1"#,
        workflow_id,
    )
    .fetch_one(pool)
    .await?;

    Ok(max.map(|n| n + 1).unwrap_or(0))
}
