//! `db` crate — pure persistence layer.
//!
//! Provides a connection pool, typed row structs, a [`Repository`] trait
//! abstraction, and its Postgres implementation for every table in the
//! schema. No business logic lives here.

pub mod error;
pub mod models;
pub mod pool;
pub mod repository;

pub use error::DbError;
pub use pool::DbPool;
pub use repository::{NewJobStep, PgRepository, Repository};
