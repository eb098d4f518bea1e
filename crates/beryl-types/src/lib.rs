//! # beryl-types: Core types for `Beryl`
//!
//! This crate contains shared types used across the `Beryl` system:
//! - Log identity ([`SeqNo`], [`LogEntry`])
//! - Write concern ([`WriteConcern`], [`InvalidWriteConcern`])
//! - Replica identity ([`ReplicaAddr`])
//! - Wire bodies for the HTTP surface ([`wire`])

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod wire;

// ============================================================================
// Sequence Numbers
// ============================================================================

/// Position of a message within the replicated log.
///
/// Sequence numbers are assigned by the primary, start at 1, and are dense:
/// the primary's log at any instant holds exactly `1..=len`. A replica may
/// see them arrive out of order, but only ever applies them contiguously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeqNo(u64);

impl SeqNo {
    /// The first sequence number in any log.
    pub const FIRST: SeqNo = SeqNo(1);

    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the sequence number as a `u64`.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for SeqNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SeqNo {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<SeqNo> for u64 {
    fn from(seq: SeqNo) -> Self {
        seq.0
    }
}

// ============================================================================
// Log Entries
// ============================================================================

/// A single committed message: sequence number plus opaque payload.
///
/// Entries are immutable once created. The payload is treated as UTF-8 text
/// on the wire but carries no further structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: SeqNo,
    pub payload: String,
}

impl LogEntry {
    pub fn new(seq: SeqNo, payload: impl Into<String>) -> Self {
        Self {
            seq,
            payload: payload.into(),
        }
    }
}

// ============================================================================
// Write Concern
// ============================================================================

/// Per-request write concern: how many nodes (primary included) must hold a
/// message before the append call returns.
///
/// Valid values are `1..=N+1` for a cluster of N replicas. `W = 1` returns
/// as soon as the primary has assigned a sequence number; `W = N+1` waits
/// for every replica to acknowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WriteConcern(u32);

impl WriteConcern {
    /// Validates `w` against a cluster of `replica_count` replicas.
    pub fn for_cluster(w: u32, replica_count: usize) -> Result<Self, InvalidWriteConcern> {
        let max = replica_count as u32 + 1;
        if w < 1 || w > max {
            return Err(InvalidWriteConcern { requested: w, max });
        }
        Ok(Self(w))
    }

    /// The default write concern: every node, primary plus all replicas.
    pub fn full(replica_count: usize) -> Self {
        Self(replica_count as u32 + 1)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Number of distinct replica acknowledgements required before the
    /// append may return. The primary itself counts as one toward `W`.
    pub fn replica_acks_required(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl Display for WriteConcern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Requested write concern is outside `1..=N+1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid write concern {requested}: must be between 1 and {max}")]
pub struct InvalidWriteConcern {
    /// The `w` value the client asked for.
    pub requested: u32,
    /// Largest valid value for this cluster (`N + 1`).
    pub max: u32,
}

// ============================================================================
// Replica Identity
// ============================================================================

/// Base URL identifying a replica from the primary's point of view.
///
/// The address doubles as the replica's identity when counting distinct
/// acknowledgements, so it is normalized (trailing slashes stripped) at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicaAddr(String);

impl ReplicaAddr {
    pub fn new(addr: impl Into<String>) -> Self {
        let mut addr = addr.into();
        while addr.ends_with('/') {
            addr.pop();
        }
        Self(addr)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ReplicaAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
