//! Serde helper functions for request deserialization.
//!
//! JSON clients send blank strings for "no value" and use an explicit `null`
//! to clear a nullable field. These helpers turn both quirks into options.

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string, treating blank strings as None.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default)]`: a missing field stays `None`, `null` becomes
/// `Some(None)` (clear the value), anything else becomes `Some(Some(v))`.
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
