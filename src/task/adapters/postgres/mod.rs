//! `PostgreSQL` adapters for task and participation persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskStore, TaskPgPool, build_pool};
