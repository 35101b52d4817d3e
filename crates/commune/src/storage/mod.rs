//! Storage backend implementations.
//!
//! This module provides concrete implementations of the repository traits
//! defined in `commune_core::storage`. The implementation is selected at
//! compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): HashMaps behind a `tokio::sync::RwLock`
//! - `postgres`: PostgreSQL through a `sqlx` connection pool
//!
//! These features are mutually exclusive - only one storage backend can be
//! enabled at a time.
//!
//! # Examples
//!
//! Build with Postgres:
//! ```bash
//! cargo build -p commune --no-default-features --features postgres
//! ```

// Compile-time checks for mutual exclusivity
#[cfg(all(feature = "inmemory", feature = "postgres"))]
compile_error!(
    "Features 'inmemory' and 'postgres' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "inmemory", feature = "postgres")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'postgres' feature. \
    Example: cargo build -p commune --no-default-features --features postgres"
);

#[cfg(feature = "inmemory")]
mod inmemory;

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryRepository;

#[cfg(feature = "postgres")]
pub use postgres::PostgresRepository;

use crate::config::{DatabaseConfig, DatabaseEndpoint};

/// The compiled-in backend.
#[cfg(feature = "inmemory")]
pub type Repository = InMemoryRepository;

#[cfg(feature = "postgres")]
pub type Repository = PostgresRepository;

#[cfg(feature = "inmemory")]
pub const BACKEND: &str = "inmemory";

#[cfg(feature = "postgres")]
pub const BACKEND: &str = "postgres";

/// Whether records written through the compiled-in backend outlive the process.
#[cfg(feature = "inmemory")]
pub const PERSISTENT: bool = false;

#[cfg(feature = "postgres")]
pub const PERSISTENT: bool = true;

/// Opens the compiled-in backend.
#[cfg(feature = "inmemory")]
pub async fn open(
    _config: &DatabaseConfig,
    _endpoint: &DatabaseEndpoint,
) -> Result<Repository, anyhow::Error> {
    tracing::warn!("Using in-memory storage, data is lost on shutdown");
    Ok(InMemoryRepository::new())
}

/// Opens the compiled-in backend.
#[cfg(feature = "postgres")]
pub async fn open(
    config: &DatabaseConfig,
    endpoint: &DatabaseEndpoint,
) -> Result<Repository, anyhow::Error> {
    Ok(PostgresRepository::connect(config, endpoint).await?)
}
