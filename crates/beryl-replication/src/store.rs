//! Replica-side ingress and the contiguous applied prefix.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tracing::debug;

use beryl_types::SeqNo;

/// Outcome of one ingress call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// The store already held this sequence number; nothing changed.
    pub duplicate: bool,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Contiguous applied prefix, positions `1..=len`. This is what reads
    /// return.
    applied: Vec<String>,

    /// Out-of-order arrivals, keyed by sequence number. Every key here is
    /// strictly greater than `applied.len() + 1`. Invisible to reads.
    pending: BTreeMap<SeqNo, String>,
}

impl StoreInner {
    fn next_seq(&self) -> SeqNo {
        SeqNo::new(self.applied.len() as u64 + 1)
    }

    fn check_invariants(&self) {
        debug_assert!(
            self.pending.keys().all(|&seq| seq > self.next_seq()),
            "pending entry at or below the applied frontier"
        );
    }
}

/// A replica's message store: at-least-once ingress, exactly-once apply.
///
/// Entries arrive in any order and any number of times; the store applies
/// each sequence number once, in order, and buffers everything ahead of the
/// frontier. The applied prefix only ever grows.
#[derive(Debug, Default)]
pub struct ReplicaStore {
    inner: Mutex<StoreInner>,
}

impl ReplicaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts one `(seq, payload)` delivery.
    ///
    /// Duplicates are detected by sequence number alone and leave the store
    /// untouched. A fresh entry at the frontier is applied immediately and
    /// drains any directly following buffered entries; a fresh entry past
    /// the frontier is buffered.
    pub fn ingest(&self, seq: SeqNo, payload: &str) -> IngestOutcome {
        let mut inner = self.inner.lock().unwrap();

        if seq < inner.next_seq() || inner.pending.contains_key(&seq) {
            debug!(%seq, "duplicate delivery ignored");
            return IngestOutcome { duplicate: true };
        }

        if seq == inner.next_seq() {
            inner.applied.push(payload.to_string());
            let mut next = seq.next();
            while let Some(buffered) = inner.pending.remove(&next) {
                inner.applied.push(buffered);
                next = next.next();
            }
            debug!(%seq, applied = inner.applied.len(), "entry applied");
        } else {
            inner.pending.insert(seq, payload.to_string());
            debug!(%seq, waiting_for = %inner.next_seq(), "entry buffered");
        }

        inner.check_invariants();
        IngestOutcome { duplicate: false }
    }

    /// Whether `seq` is already applied or buffered. Lets the ingress layer
    /// short-circuit duplicates before any artificial delay.
    pub fn contains(&self, seq: SeqNo) -> bool {
        let inner = self.inner.lock().unwrap();
        seq < inner.next_seq() || inner.pending.contains_key(&seq)
    }

    /// Copy of the applied prefix. Buffered entries stay invisible until
    /// the gap before them fills.
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().unwrap().applied.clone()
    }

    /// Length of the applied prefix.
    pub fn applied_len(&self) -> usize {
        self.inner.lock().unwrap().applied.len()
    }

    /// Number of buffered out-of-order entries.
    pub fn pending_len(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn seq(n: u64) -> SeqNo {
        SeqNo::new(n)
    }

    #[test]
    fn in_order_delivery_applies_directly() {
        let store = ReplicaStore::new();
        assert!(!store.ingest(seq(1), "a").duplicate);
        assert!(!store.ingest(seq(2), "b").duplicate);
        assert_eq!(store.snapshot(), vec!["a", "b"]);
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn gaps_are_hidden_until_filled() {
        let store = ReplicaStore::new();
        store.ingest(seq(1), "m1");
        store.ingest(seq(2), "m2");
        store.ingest(seq(4), "m4");

        // seq 4 is buffered, invisible to readers.
        assert_eq!(store.snapshot(), vec!["m1", "m2"]);
        assert_eq!(store.pending_len(), 1);

        // Filling the gap reveals everything in order.
        store.ingest(seq(3), "m3");
        assert_eq!(store.snapshot(), vec!["m1", "m2", "m3", "m4"]);
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn repeated_delivery_is_exactly_once() {
        let store = ReplicaStore::new();
        assert!(!store.ingest(seq(1), "x").duplicate);
        assert!(store.ingest(seq(1), "x").duplicate);
        assert!(store.ingest(seq(1), "x").duplicate);
        assert_eq!(store.snapshot(), vec!["x"]);
    }

    #[test]
    fn buffered_entry_reports_duplicate_on_redelivery() {
        let store = ReplicaStore::new();
        assert!(!store.ingest(seq(42), "x").duplicate);
        assert!(store.ingest(seq(42), "x").duplicate);

        // Still invisible: lower seqs are missing.
        assert_eq!(store.snapshot(), Vec::<String>::new());
        assert_eq!(store.pending_len(), 1);
    }

    #[test]
    fn contains_sees_applied_and_buffered() {
        let store = ReplicaStore::new();
        store.ingest(seq(1), "a");
        store.ingest(seq(3), "c");

        assert!(store.contains(seq(1)));
        assert!(store.contains(seq(3)));
        assert!(!store.contains(seq(2)));
        assert!(!store.contains(seq(4)));
    }

    #[test]
    fn deep_drain_after_gap_fill() {
        let store = ReplicaStore::new();
        for n in (2..=10).rev() {
            store.ingest(seq(n), &format!("m{n}"));
        }
        assert_eq!(store.applied_len(), 0);

        store.ingest(seq(1), "m1");
        assert_eq!(
            store.snapshot(),
            (1..=10).map(|n| format!("m{n}")).collect::<Vec<_>>()
        );
    }

    proptest! {
        /// Deliver an arbitrary interleaving (with duplicates) of a dense
        /// range; the applied prefix must always be the longest contiguous
        /// prefix of what was delivered, and redelivering everything must
        /// change nothing.
        #[test]
        fn applied_is_longest_contiguous_prefix(
            deliveries in proptest::collection::vec(1..=30u64, 0..80)
        ) {
            let store = ReplicaStore::new();
            for &n in &deliveries {
                store.ingest(seq(n), &format!("m{n}"));
            }

            let delivered: std::collections::BTreeSet<u64> = deliveries.iter().copied().collect();
            let mut expected = Vec::new();
            let mut next = 1;
            while delivered.contains(&next) {
                expected.push(format!("m{next}"));
                next += 1;
            }
            prop_assert_eq!(store.snapshot(), expected.clone());

            // Idempotence: a full replay is all duplicates and a no-op.
            for &n in &deliveries {
                let payload = format!("m{}", n);
                prop_assert!(store.ingest(seq(n), &payload).duplicate);
            }
            prop_assert_eq!(store.snapshot(), expected);
            prop_assert_eq!(store.pending_len(), delivered.len() - store.applied_len());
        }
    }
}
