//! Client configuration.
//!
//! Resolution order, lowest to highest precedence: built-in defaults, an
//! optional TOML file, the `MUTATOR_BACKEND_URL` environment variable, then
//! command-line flags (applied by the binary).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MutatorError, Result};

/// Environment variable that overrides [`ClientConfig::base_url`].
pub const BACKEND_URL_ENV: &str = "MUTATOR_BACKEND_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the mutation service, without the `/api/v{n}` prefix.
    pub base_url: String,
    pub api_version: u32,
    pub connect_timeout_ms: u64,
    /// Upper bound on one mutate call. A call still pending after this
    /// resolves its cache entry as failed.
    pub request_timeout_ms: u64,
    pub health_interval_ms: u64,
    /// Completed cache entries kept before least-recently-used eviction.
    pub cache_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: "http://localhost:8080".to_string(),
            api_version: 1,
            connect_timeout_ms: 3_000,
            request_timeout_ms: 10_000,
            health_interval_ms: 5_000,
            cache_capacity: 64,
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Defaults, overlaid with `path` when given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(MutatorError::Config("base_url must not be empty".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(MutatorError::Config("request_timeout_ms must be positive".into()));
        }
        if self.health_interval_ms == 0 {
            return Err(MutatorError::Config("health_interval_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }
}
