//! `PostgreSQL` adapters for case task persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskLock, PostgresTaskRepository, TaskPgPool};
