//! Process configuration read from environment variables.
//!
//! `.env` files are loaded by `main` before this runs; every key has a
//! default except the ones that only matter for a backend that is not in use.

use std::time::Duration;

/// Which record store backs the three collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Neo4j,
    Memory,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub store_backend: StoreBackend,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    /// Bound on every single store call
    pub store_timeout: Duration,
    pub saga_db: String,
    /// Engine-wide deadline for one create/update; `None` disables it
    pub operation_deadline: Option<Duration>,
    pub cors_allowed_origins: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let server_port = match get("SERVER_PORT").or_else(|| get("PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid("SERVER_PORT", &raw, e))?,
            None => 3000,
        };

        let store_backend = match get("STORE_BACKEND").as_deref() {
            None | Some("neo4j") => StoreBackend::Neo4j,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "STORE_BACKEND",
                    other,
                    "expected 'neo4j' or 'memory'",
                ))
            }
        };

        let store_timeout = match get("STORE_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|e| ConfigError::invalid("STORE_TIMEOUT_SECS", &raw, e))?;
                if secs == 0 {
                    return Err(ConfigError::invalid(
                        "STORE_TIMEOUT_SECS",
                        &raw,
                        "must be at least 1",
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(5),
        };

        let operation_deadline = match get("EVENT_OPERATION_DEADLINE_MS") {
            Some(raw) => {
                let ms = raw
                    .parse::<u64>()
                    .map_err(|e| ConfigError::invalid("EVENT_OPERATION_DEADLINE_MS", &raw, e))?;
                (ms > 0).then(|| Duration::from_millis(ms))
            }
            None => None,
        };

        Ok(Self {
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port,
            store_backend,
            neo4j_uri: get("NEO4J_URI").unwrap_or_else(|| "bolt://localhost:7687".into()),
            neo4j_user: get("NEO4J_USER").unwrap_or_else(|| "neo4j".into()),
            neo4j_password: get("NEO4J_PASSWORD").unwrap_or_else(|| "password".into()),
            store_timeout,
            saga_db: get("SAGA_DB").unwrap_or_else(|| "sagas.db".into()),
            operation_deadline,
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS"),
        })
    }
}
