//! PostgreSQL storage backend implementation.
//!
//! Implements the repository traits over a `sqlx` connection pool. The schema
//! is created at startup; uniqueness and references are enforced by table
//! constraints.

mod conversions;
mod error;
mod repository;
mod schema;

pub use repository::PostgresRepository;
