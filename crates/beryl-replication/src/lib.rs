//! Replication engine for the Beryl in-memory log.
//!
//! One primary accepts writes, assigns dense sequence numbers, and fans each
//! entry out to every replica; clients pick a per-request write concern `W`
//! and the append returns once the primary plus `W - 1` distinct replicas
//! hold the message. Replicas apply entries in sequence order and expose
//! only the contiguous applied prefix to readers.
//!
//! # Architecture
//!
//! ```text
//! Client ──append(msg, W)──► Primary
//!                              │ Ledger.assign (total order)
//!                              ├──queue──► worker ──replicate──► Replica₁
//!                              ├──queue──► worker ──replicate──► Replica₂
//!                              │              │
//!                              │◄────ack──────┘ (AckRegistry)
//!                              │
//! Client ◄──{seq, acks}──────┘ (once W − 1 replicas acked)
//! ```
//!
//! Each replica owns exactly one delivery queue and one worker, so a replica
//! sees sequence numbers in non-decreasing order; a failed delivery is
//! retried with bounded exponential back-off and never skipped. Replication
//! keeps running after the client has been answered, so every entry
//! eventually reaches every reachable replica regardless of `W`.
//!
//! # Key types
//!
//! - [`Primary`]: write coordinator tying the pieces together
//! - [`Ledger`]: sequence assignment and the authoritative log
//! - [`Dispatcher`]: per-replica queues, workers, and retry policy
//! - [`HealthMonitor`]: liveness probing and the quorum gate
//! - [`ReplicaStore`]: replica-side dedup, gap buffering, applied prefix
//! - [`ReplicaTransport`]: the seam between the engine and the wire

mod acks;
mod dispatcher;
mod error;
mod health;
mod ledger;
mod primary;
mod store;
mod transport;

#[cfg(test)]
mod tests;

pub use acks::{AckRegistry, AckWaiter};
pub use dispatcher::{BackoffPolicy, Dispatcher};
pub use error::{CoreError, CoreResult};
pub use health::{HealthMonitor, QuorumView, ReplicaLiveness};
pub use ledger::Ledger;
pub use primary::{AppendReceipt, Primary, PrimaryOptions};
pub use store::{IngestOutcome, ReplicaStore};
pub use transport::{ReplicaTransport, ReplicateOutcome, TransportError};
