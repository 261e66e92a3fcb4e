//! Uploaded file metadata (spec §3: "Engine treats files as read-only").
//! The bytes live in a flat content directory keyed by `file_id` (spec §6);
//! this table only records the metadata needed to locate and validate them.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::UploadedFileRow, DbError};

/// `id` is supplied by the caller (the API upload handler) rather than
/// generated here, so the content directory can be keyed by it before the
/// row exists (spec §6: "file blobs in a flat content directory keyed by
/// file_id").
pub async fn create_uploaded_file(
    pool: &PgPool,
    id: Uuid,
    filename: &str,
    mime_type: &str,
    size_bytes: i64,
    path: &str,
) -> Result<UploadedFileRow, DbError> {
    let now = Utc::now();

    let row = sqlx::query_as!(
        UploadedFileRow,
        r#"
        INSERT INTO uploaded_files (id, filename, mime_type, size_bytes, path, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, filename, mime_type, size_bytes, path, created_at
        "#,
        id,
        filename,
        mime_type,
        size_bytes,
        path,
        now,
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn get_uploaded_file(pool: &PgPool, id: Uuid) -> Result<UploadedFileRow, DbError> {
    let row = sqlx::query_as!(
        UploadedFileRow,
        r#"SELECT id, filename, mime_type, size_bytes, path, created_at FROM uploaded_files WHERE id = $1"#,
        id,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}
