//! In-memory storage backend.
//!
//! Stores every table in HashMaps behind one `tokio::sync::RwLock`. This is
//! the default backend and the one the test suite runs against; nothing is
//! persisted.
//!
//! # Example
//!
//! ```rust,ignore
//! use commune::storage::InMemoryRepository;
//!
//! let repo = InMemoryRepository::new();
//! ```

mod repository;

pub use repository::InMemoryRepository;
