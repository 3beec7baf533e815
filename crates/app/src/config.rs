//! Process configuration read from the environment.
//!
//! | variable             | meaning                                          |
//! |----------------------|--------------------------------------------------|
//! | `CURATOR_STORE`      | `memory` (default) or `postgres`                 |
//! | `DATABASE_URL`       | Postgres connection string, required for postgres |
//! | `REDIS_URL`          | permission cache backend (needs the `redis` feature) |
//! | `CURATOR_LOCK_TOKEN` | constant marker written by pessimistic acquires  |

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has unsupported value '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} is set but this build lacks the feature to use it")]
    Unsupported(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres { database_url: String },
}

impl StoreBackend {
    /// Backend name, safe to log.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub redis_url: Option<String>,
    pub lock_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            redis_url: None,
            lock_token: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store = match var("CURATOR_STORE").as_deref() {
            None | Some("memory") => StoreBackend::Memory,
            Some("postgres") => StoreBackend::Postgres {
                database_url: var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "CURATOR_STORE",
                    value: other.to_string(),
                });
            }
        };

        let redis_url = var("REDIS_URL");
        if redis_url.is_some() && !cfg!(feature = "redis") {
            return Err(ConfigError::Unsupported("REDIS_URL"));
        }

        Ok(Self {
            store,
            redis_url,
            lock_token: var("CURATOR_LOCK_TOKEN"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_to_the_in_memory_store() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn postgres_requires_a_database_url() {
        let err = AppConfig::from_lookup(lookup(&[("CURATOR_STORE", "postgres")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let config = AppConfig::from_lookup(lookup(&[
            ("CURATOR_STORE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/curator"),
            ("CURATOR_LOCK_TOKEN", "  "),
        ]))
        .unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/curator".into()
            }
        );
        assert_eq!(config.lock_token, None);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("CURATOR_STORE", "mongo")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CURATOR_STORE", .. }));
    }
}
