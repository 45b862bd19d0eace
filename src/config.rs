//! Engine configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration. Values are layered: defaults, then the YAML file named by
//! `ACTIVATOR_CONFIG`, then individual environment overrides.
//!
//! ```yaml
//! key_prefix: activator
//! cache_policy: revalidate
//! storage:
//!   backend: sqlite
//!   path: /var/lib/activator/state.db
//! retry:
//!   attempts: 3
//!   backoff_ms: 50
//! random_seed: 7
//! server:
//!   bind: 127.0.0.1:9000
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How cached source configurations are treated on the fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Cached configurations never expire and are trusted as-is.
    #[default]
    Persistent,
    /// Fast-path matches are checked against the destination signature; a
    /// stale configuration is dropped and search runs instead.
    Revalidate,
    /// Never consult or write the configuration cache.
    Disabled,
}

impl FromStr for CachePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "persistent" => Ok(CachePolicy::Persistent),
            "revalidate" => Ok(CachePolicy::Revalidate),
            "disabled" => Ok(CachePolicy::Disabled),
            other => Err(ConfigError::Invalid(format!("unknown cache policy '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file for the sqlite backend.
    pub path: Option<String>,
}

/// Retry policy applied to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    /// Backoff before attempt `n + 1` is `n * backoff_ms`.
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Top-level configuration of the activation engine and its server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Namespace for every persisted key.
    pub key_prefix: String,
    pub cache_policy: CachePolicy,
    pub storage: StorageConfig,
    pub retry: RetryConfig,
    /// Use a deterministic random source seeded with this value.
    pub random_seed: Option<u64>,
    pub server: ServerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_prefix: "activator".to_string(),
            cache_policy: CachePolicy::default(),
            storage: StorageConfig::default(),
            retry: RetryConfig::default(),
            random_seed: None,
            server: ServerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load from `ACTIVATOR_CONFIG` (if set), apply environment overrides
    /// and validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("ACTIVATOR_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides looked up by variable name.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("PORT") {
            self.server.bind = format!("0.0.0.0:{}", port);
        }
        if let Some(store) = lookup("ACTIVATOR_STORE") {
            self.storage.backend = match store.to_ascii_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "sqlite" => StorageBackend::Sqlite,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "unknown storage backend '{}'",
                        other
                    )))
                }
            };
        }
        if let Some(path) = lookup("ACTIVATOR_DB_PATH") {
            self.storage.path = Some(path);
        }
        if let Some(seed) = lookup("ACTIVATOR_SEED") {
            let seed = seed
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("invalid seed '{}'", seed)))?;
            self.random_seed = Some(seed);
        }
        if let Some(policy) = lookup("ACTIVATOR_CACHE_POLICY") {
            self.cache_policy = policy.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_prefix.is_empty() {
            return Err(ConfigError::Invalid("key_prefix must not be empty".into()));
        }
        if self.retry.attempts == 0 {
            return Err(ConfigError::Invalid("retry.attempts must be at least 1".into()));
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.is_none() {
            return Err(ConfigError::Invalid(
                "storage.path is required for the sqlite backend".into(),
            ));
        }
        Ok(())
    }
}
