//! Engine error types.

use beryl_types::InvalidWriteConcern;
use thiserror::Error;

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors surfaced to the write path.
///
/// Replica transport failures never appear here: the dispatcher swallows
/// and retries them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested write concern is outside `1..=N+1`.
    #[error(transparent)]
    InvalidWriteConcern(#[from] InvalidWriteConcern),

    /// Too few nodes are healthy to admit a new write. No sequence number
    /// was assigned.
    #[error("no quorum: {healthy} of {required} required nodes healthy")]
    NoQuorum {
        /// Healthy node count, primary included.
        healthy: usize,
        /// Node count needed for quorum.
        required: usize,
    },
}
