//! Configuration for Beryl nodes.
//!
//! Both node roles are configured entirely from the environment, with
//! built-in defaults underneath (lowest precedence):
//!
//! | Variable | Role | Meaning |
//! |---|---|---|
//! | `SECONDARIES` | primary | Comma-separated replica base URLs; defines N |
//! | `HOST` | both | Bind host |
//! | `PORT` | both | Bind port |
//! | `DELAY_MS` | replica | Artificial ingress delay (test hook) |
//! | `LOG_LEVEL` | both | Subscriber filter directive |
//! | `HEALTH_INTERVAL_MS` | primary | Probe cadence |
//! | `HEALTH_TIMEOUT_MS` | primary | Grace window; defaults to 3x interval |
//!
//! Nothing is persisted; a process restart starts from an empty log.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use beryl_types::ReplicaAddr;

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::load_from_env;

/// Configuration for a primary node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryConfig {
    /// Bind host.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Comma-separated replica base URLs, e.g.
    /// `http://127.0.0.1:8081,http://127.0.0.1:8082`.
    pub secondaries: String,

    /// Log filter directive (`tracing_subscriber::EnvFilter` syntax).
    pub log_level: String,

    /// Health probe cadence in milliseconds.
    pub health_interval_ms: u64,

    /// Grace window in milliseconds before an unresponsive replica is
    /// considered unhealthy. Defaults to three probe intervals.
    pub health_timeout_ms: Option<u64>,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            secondaries: String::new(),
            log_level: "info".to_string(),
            health_interval_ms: 1_000,
            health_timeout_ms: None,
        }
    }
}

impl PrimaryConfig {
    /// Loads the configuration from the environment over defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_from_env(&Self::default())
    }

    /// The `host:port` string to bind the listener to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed replica addresses. Empty segments are ignored, so a trailing
    /// comma in `SECONDARIES` is harmless.
    pub fn secondary_addrs(&self) -> Vec<ReplicaAddr> {
        self.secondaries
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ReplicaAddr::new)
            .collect()
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    /// Grace window for replica liveness.
    pub fn health_grace(&self) -> Duration {
        Duration::from_millis(
            self.health_timeout_ms
                .unwrap_or(self.health_interval_ms.saturating_mul(3)),
        )
    }
}

/// Configuration for a replica node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicaConfig {
    /// Bind host.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Artificial delay injected into ingress before a fresh entry is
    /// applied, in milliseconds. Demonstrates the write-concern wait.
    pub delay_ms: u64,

    /// Log filter directive.
    pub log_level: String,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
            delay_ms: 0,
            log_level: "info".to_string(),
        }
    }
}

impl ReplicaConfig {
    /// Loads the configuration from the environment over defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_from_env(&Self::default())
    }

    /// The `host:port` string to bind the listener to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured ingress delay.
    pub fn ingress_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
