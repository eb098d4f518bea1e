//! Per-replica delivery queues, workers, and the retry policy.
//!
//! Every replica owns one unbounded FIFO queue consumed by exactly one
//! worker task. Single-consumer FIFO is what guarantees a replica sees
//! sequence numbers in non-decreasing order, so a worker never skips a
//! failed entry: it retries the same delivery with bounded exponential
//! back-off until the replica takes it. A `duplicate` answer counts as
//! success: the replica already holds that sequence number, so ordering
//! is safe to advance.
//!
//! Per queue entry the lifecycle is `queued → inflight → (ack | failed)`,
//! with `failed` looping back to `inflight` after the back-off delay.
//! There is no dropped state.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use beryl_types::{LogEntry, ReplicaAddr};

use crate::acks::AckRegistry;
use crate::transport::ReplicaTransport;

/// Bounded exponential back-off with jitter.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial: Duration,

    /// Growth factor per failed attempt.
    pub multiplier: u32,

    /// Upper bound on the base delay.
    pub cap: Duration,

    /// Maximum extra delay as a fraction of the base (0.2 = up to +20%),
    /// drawn uniformly per retry.
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            multiplier: 2,
            cap: Duration::from_secs(5),
            jitter: 0.2,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let base = self
            .initial
            .saturating_mul(self.multiplier.saturating_pow(exponent))
            .min(self.cap);
        let jitter = base.mul_f64(rand::thread_rng().gen_range(0.0..=self.jitter));
        base + jitter
    }
}

struct ReplicaChannel {
    addr: ReplicaAddr,
    queue: mpsc::UnboundedSender<LogEntry>,
}

/// Fan-out stage of the primary: one queue + worker per replica.
pub struct Dispatcher {
    channels: Vec<ReplicaChannel>,
}

impl Dispatcher {
    /// Spawns one worker task per replica and returns the queue handles.
    pub fn spawn(
        replicas: &[ReplicaAddr],
        transport: Arc<dyn ReplicaTransport>,
        acks: Arc<AckRegistry>,
        backoff: BackoffPolicy,
    ) -> Self {
        let channels = replicas
            .iter()
            .map(|addr| {
                let (tx, rx) = mpsc::unbounded_channel();
                tokio::spawn(run_worker(
                    addr.clone(),
                    rx,
                    Arc::clone(&transport),
                    Arc::clone(&acks),
                    backoff,
                ));
                ReplicaChannel {
                    addr: addr.clone(),
                    queue: tx,
                }
            })
            .collect();

        Self { channels }
    }

    /// Appends `entry` to every replica queue. Never blocks, never drops.
    pub fn fan_out(&self, entry: &LogEntry) {
        for channel in &self.channels {
            if channel.queue.send(entry.clone()).is_err() {
                // Workers only stop when the runtime shuts down.
                error!(replica = %channel.addr, seq = %entry.seq, "replication worker gone");
            }
        }
    }

    pub fn replica_count(&self) -> usize {
        self.channels.len()
    }
}

/// Consumes one replica's queue in FIFO order, delivering each entry until
/// the replica acknowledges it.
async fn run_worker(
    addr: ReplicaAddr,
    mut queue: mpsc::UnboundedReceiver<LogEntry>,
    transport: Arc<dyn ReplicaTransport>,
    acks: Arc<AckRegistry>,
    backoff: BackoffPolicy,
) {
    while let Some(entry) = queue.recv().await {
        deliver_until_acked(&addr, &entry, transport.as_ref(), backoff).await;
        acks.record(entry.seq, addr.clone());
    }
    debug!(replica = %addr, "replication worker stopped");
}

async fn deliver_until_acked(
    addr: &ReplicaAddr,
    entry: &LogEntry,
    transport: &dyn ReplicaTransport,
    backoff: BackoffPolicy,
) {
    let mut attempt: u32 = 0;
    loop {
        match transport.replicate(addr, entry.seq, &entry.payload).await {
            Ok(outcome) => {
                if outcome.duplicate {
                    debug!(replica = %addr, seq = %entry.seq, "replica already held entry");
                } else {
                    debug!(replica = %addr, seq = %entry.seq, attempt, "entry replicated");
                }
                return;
            }
            Err(err) => {
                attempt += 1;
                let delay = backoff.delay(attempt);
                warn!(
                    replica = %addr,
                    seq = %entry.seq,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "replicate failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
