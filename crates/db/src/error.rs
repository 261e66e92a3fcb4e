//! Typed error type for the db crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("row not found")]
    NotFound,

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("stored value could not be decoded: {0}")]
    Decode(String),

    #[error("admission queue full")]
    QueueFull,
}

impl From<DbError> for core::FlowError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => core::FlowError::NotFound("entity not found".into()),
            DbError::QueueFull => core::FlowError::QueueFull,
            other => core::FlowError::Internal(other.to_string()),
        }
    }
}
