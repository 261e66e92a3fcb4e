//! Edge CRUD operations. Cycle/duplicate/cross-workflow checks happen in the
//! `graph` crate before `create_edge` is ever called (spec §3 invariant 1:
//! "cycle-creating edge insertions fail atomically" — they fail before
//! reaching the database at all).

use uuid::Uuid;
use sqlx::PgPool;

use crate::{models::EdgeRow, DbError};

pub async fn create_edge(
    pool: &PgPool,
    workflow_id: Uuid,
    from_node_id: Uuid,
    to_node_id: Uuid,
    from_port: &str,
    to_port: &str,
    condition: Option<&str>,
) -> Result<EdgeRow, DbError> {
    let id = Uuid::new_v4();

    let row = sqlx::query_as!(
        EdgeRow,
        r#"
        INSERT INTO edges (id, workflow_id, from_node_id, to_node_id, from_port, to_port, condition)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, workflow_id, from_node_id, to_node_id, from_port, to_port, condition
        "#,
        id,
        workflow_id,
        from_node_id,
        to_node_id,
        from_port,
        to_port,
        condition,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn list_edges(pool: &PgPool, workflow_id: Uuid) -> Result<Vec<EdgeRow>, DbError> {
    let rows = sqlx::query_as!(
        EdgeRow,
        r#"
        SELECT id, workflow_id, from_node_id, to_node_id, from_port, to_port, condition
        FROM edges
        WHERE workflow_id = $1
        "#,
        workflow_id,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
