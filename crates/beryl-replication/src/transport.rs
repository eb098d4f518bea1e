//! The seam between the engine and the wire.
//!
//! Dispatcher workers and the health monitor talk to replicas only through
//! [`ReplicaTransport`], so the engine runs unchanged over HTTP in
//! production and over in-memory fakes in tests.

use async_trait::async_trait;
use thiserror::Error;

use beryl_types::{ReplicaAddr, SeqNo};

/// Outcome of a successful `replicate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicateOutcome {
    /// The replica already held this sequence number. Callers treat this
    /// exactly like a fresh acknowledgement: ordering is safe to advance.
    pub duplicate: bool,
}

/// Transport-level failure talking to a replica.
///
/// Every variant is retryable; the dispatcher never gives up on an entry.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or timed out.
    #[error("request failed: {0}")]
    Request(String),

    /// The replica answered with a non-success status.
    #[error("unexpected status {status}")]
    Status { status: u16 },

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Body(String),
}

/// Request/response channel to a single replica, addressed by base URL.
#[async_trait]
pub trait ReplicaTransport: Send + Sync + 'static {
    /// Delivers one log entry to a replica. At-least-once semantics: the
    /// caller may retry the same `(seq, payload)` any number of times.
    async fn replicate(
        &self,
        replica: &ReplicaAddr,
        seq: SeqNo,
        payload: &str,
    ) -> Result<ReplicateOutcome, TransportError>;

    /// Liveness probe. `Ok` means the replica answered in time.
    async fn probe(&self, replica: &ReplicaAddr) -> Result<(), TransportError>;
}
