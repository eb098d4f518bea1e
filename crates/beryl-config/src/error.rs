//! Configuration error types.

use thiserror::Error;

/// Errors raised while assembling a node configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layered configuration could not be built or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
