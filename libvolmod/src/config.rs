//! Client configuration.
//!
//! [`ClientConfig`] can be loaded from a YAML file or from environment
//! variables:
//! - `CSI_ADDRESS`: driver endpoint. Defaults to `/run/csi/socket`.
//! - `CSI_TIMEOUT_SECS`: bound on the whole connect + probe + resolve
//!   sequence. Defaults to `10`.
//! - `CSI_PROBE_INTERVAL_MS`: pause between readiness probes. Defaults to `1000`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ENV_ADDRESS: &str = "CSI_ADDRESS";
const ENV_TIMEOUT_SECS: &str = "CSI_TIMEOUT_SECS";
const ENV_PROBE_INTERVAL_MS: &str = "CSI_PROBE_INTERVAL_MS";

/// Connection settings for a [`crate::ModifyClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Driver endpoint, e.g. `unix:///csi/csi.sock` or `127.0.0.1:10000`.
    pub endpoint: String,
    /// Establishment timeout in seconds.
    pub timeout_secs: u64,
    /// Readiness probe interval in milliseconds.
    pub probe_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "/run/csi/socket".to_owned(),
            timeout_secs: 10,
            probe_interval_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Config with the given endpoint and default timings.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Establishment timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause between readiness probes.
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Load and validate a YAML config file. Missing fields take defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(endpoint) = lookup(ENV_ADDRESS) {
            config.endpoint = endpoint;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = parse_u64(ENV_TIMEOUT_SECS, value)?;
        }
        if let Some(value) = lookup(ENV_PROBE_INTERVAL_MS) {
            config.probe_interval_ms = parse_u64(ENV_PROBE_INTERVAL_MS, value)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that can never produce a working client.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_owned()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_owned()));
        }
        if self.probe_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "probe_interval_ms must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

fn parse_u64(var: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
