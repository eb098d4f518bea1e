//! Acknowledgement tracking for in-flight appends.
//!
//! Dispatcher workers publish `(seq, replica)` pairs as deliveries succeed;
//! each append waits on its own entry, so a blocked high-`W` request never
//! wakes or delays anyone else. Acks may arrive in any order and more than
//! once per replica; only distinct replica addresses count.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::debug;

use beryl_types::{ReplicaAddr, SeqNo};

struct PendingAppend {
    /// Distinct replica acks needed before the waiter is satisfied.
    required: usize,
    acks: HashSet<ReplicaAddr>,
    notify: Arc<Notify>,
}

/// Registry of appends still waiting for their write concern.
///
/// Entries live from just before fan-out until the coordinator returns;
/// acks recorded for an unknown sequence number are deliberately dropped
/// (the waiter is gone, replication simply carried on).
#[derive(Default)]
pub struct AckRegistry {
    pending: Mutex<HashMap<SeqNo, PendingAppend>>,
}

impl AckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an append that needs `required` distinct replica acks.
    ///
    /// Must be called before the entry is enqueued to any replica, or an
    /// early ack could be missed.
    pub fn register(self: &Arc<Self>, seq: SeqNo, required: usize) -> AckWaiter {
        let notify = Arc::new(Notify::new());
        let previous = self.pending.lock().unwrap().insert(
            seq,
            PendingAppend {
                required,
                acks: HashSet::new(),
                notify: Arc::clone(&notify),
            },
        );
        debug_assert!(previous.is_none(), "seq registered twice");

        AckWaiter {
            registry: Arc::clone(self),
            seq,
            notify,
        }
    }

    /// Records a successful delivery of `seq` to `replica`.
    pub fn record(&self, seq: SeqNo, replica: ReplicaAddr) {
        let notify = {
            let mut pending = self.pending.lock().unwrap();
            let Some(entry) = pending.get_mut(&seq) else {
                return;
            };
            if entry.acks.insert(replica.clone()) {
                debug!(%seq, %replica, acks = entry.acks.len(), "ack recorded");
            }
            Arc::clone(&entry.notify)
        };
        notify.notify_waiters();
    }

    fn satisfied(&self, seq: SeqNo) -> bool {
        self.pending
            .lock()
            .unwrap()
            .get(&seq)
            .is_none_or(|entry| entry.acks.len() >= entry.required)
    }

    fn remove(&self, seq: SeqNo) -> Vec<ReplicaAddr> {
        let entry = self.pending.lock().unwrap().remove(&seq);
        let mut acks: Vec<ReplicaAddr> = entry.map(|e| e.acks.into_iter().collect()).unwrap_or_default();
        acks.sort();
        acks
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

/// One append's handle onto the registry.
///
/// Dropping the waiter (a client disconnect mid-wait) deregisters the
/// append; the entry stays committed and replication continues untouched.
pub struct AckWaiter {
    registry: Arc<AckRegistry>,
    seq: SeqNo,
    notify: Arc<Notify>,
}

impl AckWaiter {
    /// Suspends until the required number of distinct replicas have acked.
    /// Returns immediately when the requirement is zero.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.registry.satisfied(self.seq) {
                return;
            }
            notified.await;
        }
    }

    /// Deregisters the append and returns the acks observed so far, sorted
    /// by address for a stable wire representation.
    pub fn take_acks(self) -> Vec<ReplicaAddr> {
        self.registry.remove(self.seq)
    }
}

impl Drop for AckWaiter {
    fn drop(&mut self) {
        // No-op when take_acks already ran.
        self.registry.remove(self.seq);
    }
}
