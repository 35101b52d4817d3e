//! Functional core for commune.
//!
//! Pure domain types, validation and ordering functions, error enums, and the
//! traits that the imperative shell (storage backends, identity providers)
//! implements. Nothing in this crate performs I/O.

#[cfg(feature = "auth")]
pub mod auth;
pub mod community;
pub mod serde;
pub mod storage;
