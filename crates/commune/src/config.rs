use std::env;

const DEFAULT_API_PREFIX: &str = "/api";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix for every API route (default: "/api"). Empty means no prefix.
    pub api_prefix: String,
    pub database: DatabaseConfig,
}

/// Connection parameters for the relational store. Only read by the
/// `postgres` backend.
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Full connection URL. Used as-is unless an SSH tunnel replaces the endpoint.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: Option<String>,
    pub max_connections: u32,
}

/// Host and port the server actually connects to.
#[cfg_attr(not(feature = "postgres"), allow(dead_code))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseEndpoint {
    pub host: String,
    pub port: u16,
    /// True when the endpoint is the local side of an SSH tunnel.
    pub tunneled: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `API_PREFIX` - Route prefix (default: "/api")
    /// - `DATABASE_URL` - Full connection URL (optional)
    /// - `DB_HOST` - Database host (default: "localhost")
    /// - `DB_PORT` - Database port (default: 5432)
    /// - `DB_NAME` - Database name (default: "commune")
    /// - `DB_USER` - Database user (default: "postgres")
    /// - `DB_PASSWORD` - Database password (optional)
    /// - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            api_prefix: normalize_prefix(
                lookup("API_PREFIX")
                    .as_deref()
                    .unwrap_or(DEFAULT_API_PREFIX),
            ),
            database: DatabaseConfig {
                url: non_empty("DATABASE_URL"),
                host: non_empty("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: lookup("DB_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5432),
                name: non_empty("DB_NAME").unwrap_or_else(|| "commune".to_string()),
                user: non_empty("DB_USER").unwrap_or_else(|| "postgres".to_string()),
                password: non_empty("DB_PASSWORD"),
                max_connections: lookup("DB_MAX_CONNECTIONS")
                    .and_then(|v| v.parse().ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(5),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl DatabaseConfig {
    /// The endpoint used when no tunnel is active.
    pub fn direct_endpoint(&self) -> DatabaseEndpoint {
        DatabaseEndpoint {
            host: self.host.clone(),
            port: self.port,
            tunneled: false,
        }
    }
}

/// Forces a leading slash and drops trailing ones. `""` and `"/"` become `""`.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
