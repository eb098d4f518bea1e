//! JSON bodies for the HTTP surface.
//!
//! Shared between `beryl-server` (which serves them) and `beryl-client`
//! (which decodes them), so the two cannot drift apart.

use serde::{Deserialize, Serialize};

// ============================================================================
// Primary surface
// ============================================================================

/// Body of `POST /messages` on the primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendRequest {
    /// The message payload.
    pub msg: String,

    /// Write concern. Absent means "every node" (`N + 1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
}

/// Successful response to `POST /messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendResponse {
    /// Full log snapshot at the moment the append returned.
    pub messages: Vec<String>,

    /// Replica acknowledgements observed before returning. Excludes the
    /// primary, which always counts as one toward `w`.
    pub acks: Vec<AckEntry>,

    /// The write concern the request was served with.
    pub w: u32,

    /// Wall-clock time spent inside the append, in milliseconds.
    pub duration_ms: u64,

    /// Sequence number assigned to the message.
    pub seq: u64,
}

/// One acknowledged replica in an [`AppendResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckEntry {
    /// Replica base URL.
    pub secondary: String,

    /// Always true for entries in the list; retained for wire stability.
    pub ack: bool,
}

/// Response to `GET /messages` on either node role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<String>,
}

/// Response to `GET /health` on the primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryHealthResponse {
    pub status: String,
    /// Current log length.
    pub count: usize,
    /// Configured replica base URLs.
    pub secondaries: Vec<String>,
    /// Per-replica liveness as seen by the health monitor.
    pub secondary_statuses: Vec<SecondaryStatus>,
}

/// Liveness of one replica in a [`PrimaryHealthResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryStatus {
    pub addr: String,
    pub healthy: bool,
    /// Milliseconds since the last successful probe, if any succeeded yet.
    pub last_seen_ms: Option<u64>,
}

// ============================================================================
// Replica surface
// ============================================================================

/// Body of `POST /replicate` on a replica.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicateRequest {
    pub msg: String,
    pub seq: u64,
}

/// Response to `POST /replicate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicateResponse {
    pub status: String,
    /// True when the replica already held this sequence number; the caller
    /// treats that exactly like a fresh acknowledgement.
    pub duplicate: bool,
}

/// Response to `GET /health` on a replica.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaHealthResponse {
    pub status: String,
    /// Configured artificial ingress delay (test hook).
    pub delay_ms: u64,
    /// Applied prefix length.
    pub count: usize,
}

// ============================================================================
// Errors
// ============================================================================

/// Error body returned by every non-2xx JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable description.
    pub message: String,
}
