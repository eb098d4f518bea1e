//! Engine integration tests.
//!
//! These drive the full primary engine (ledger, dispatcher, ack registry,
//! health monitor) against in-memory replicas behind a mock transport,
//! with tokio's paused clock standing in for real back-off delays.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use beryl_types::{ReplicaAddr, SeqNo};

use crate::store::ReplicaStore;
use crate::transport::{ReplicaTransport, ReplicateOutcome, TransportError};
use crate::{CoreError, Primary, PrimaryOptions};

// ============================================================================
// Mock Cluster
// ============================================================================

struct MockReplica {
    store: ReplicaStore,
    down: AtomicBool,
    replicate_calls: AtomicUsize,
}

impl MockReplica {
    fn new() -> Self {
        Self {
            store: ReplicaStore::new(),
            down: AtomicBool::new(false),
            replicate_calls: AtomicUsize::new(0),
        }
    }
}

struct MockCluster {
    replicas: HashMap<ReplicaAddr, Arc<MockReplica>>,
}

impl MockCluster {
    fn new(count: usize) -> (Arc<Self>, Vec<ReplicaAddr>) {
        let addrs: Vec<ReplicaAddr> = (0..count)
            .map(|i| ReplicaAddr::new(format!("http://127.0.0.1:{}", 8081 + i)))
            .collect();
        let replicas = addrs
            .iter()
            .map(|addr| (addr.clone(), Arc::new(MockReplica::new())))
            .collect();
        (Arc::new(Self { replicas }), addrs)
    }

    fn replica(&self, addr: &ReplicaAddr) -> &Arc<MockReplica> {
        &self.replicas[addr]
    }

    fn set_down(&self, addr: &ReplicaAddr, down: bool) {
        self.replica(addr).down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReplicaTransport for MockCluster {
    async fn replicate(
        &self,
        replica: &ReplicaAddr,
        seq: SeqNo,
        payload: &str,
    ) -> Result<ReplicateOutcome, TransportError> {
        let replica = self.replica(replica);
        if replica.down.load(Ordering::SeqCst) {
            return Err(TransportError::Request("connection refused".into()));
        }
        replica.replicate_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = replica.store.ingest(seq, payload);
        Ok(ReplicateOutcome {
            duplicate: outcome.duplicate,
        })
    }

    async fn probe(&self, replica: &ReplicaAddr) -> Result<(), TransportError> {
        if self.replica(replica).down.load(Ordering::SeqCst) {
            Err(TransportError::Request("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

fn fast_options() -> PrimaryOptions {
    PrimaryOptions {
        health_interval: Duration::from_millis(100),
        health_grace: Duration::from_millis(300),
        ..Default::default()
    }
}

/// Lets spawned engine tasks (first health probe round included) run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}

// ============================================================================
// Write Concern Semantics
// ============================================================================

#[tokio::test(start_paused = true)]
async fn full_write_concern_reaches_every_replica() {
    let (cluster, addrs) = MockCluster::new(2);
    let primary = Primary::spawn(addrs.clone(), cluster.clone(), fast_options());
    settle().await;

    let receipt = primary.append("a".into(), None).await.unwrap();

    assert_eq!(receipt.entry.seq, SeqNo::new(1));
    assert_eq!(receipt.write_concern.as_u32(), 3);
    assert_eq!(receipt.acks.len(), 2);
    assert_eq!(primary.snapshot(), vec!["a"]);
    for addr in &addrs {
        assert_eq!(cluster.replica(addr).store.snapshot(), vec!["a"]);
    }
}

#[tokio::test(start_paused = true)]
async fn write_concern_one_returns_before_replication() {
    let (cluster, addrs) = MockCluster::new(1);
    cluster.set_down(&addrs[0], true);
    let primary = Primary::spawn(addrs.clone(), cluster.clone(), fast_options());
    settle().await;

    // One replica, so quorum needs only the primary itself.
    let receipt = primary.append("b".into(), Some(1)).await.unwrap();
    assert_eq!(receipt.entry.seq, SeqNo::new(1));
    assert!(receipt.acks.is_empty());
    assert_eq!(primary.snapshot(), vec!["b"]);
    assert_eq!(cluster.replica(&addrs[0]).store.applied_len(), 0);

    // The dispatcher keeps retrying after the client was answered.
    cluster.set_down(&addrs[0], false);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(cluster.replica(&addrs[0]).store.snapshot(), vec!["b"]);
    assert!(
        cluster.replica(&addrs[0]).replicate_calls.load(Ordering::SeqCst) >= 1
    );
}

#[tokio::test(start_paused = true)]
async fn blocked_append_does_not_delay_concurrent_writers() {
    let (cluster, addrs) = MockCluster::new(2);
    cluster.set_down(&addrs[1], true);
    let primary = Primary::spawn(addrs.clone(), cluster.clone(), fast_options());
    settle().await;

    // "c" demands every node and must block on the dead replica.
    let blocked = {
        let primary = Arc::clone(&primary);
        tokio::spawn(async move { primary.append("c".into(), Some(3)).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!blocked.is_finished());

    // A concurrent w=1 append sails through.
    let quick = primary.append("d".into(), Some(1)).await.unwrap();
    assert_eq!(quick.entry.seq, SeqNo::new(2));
    assert!(!blocked.is_finished());

    // Replica recovery unblocks the waiter; deliveries stay in seq order.
    cluster.set_down(&addrs[1], false);
    let receipt = blocked.await.unwrap().unwrap();
    assert_eq!(receipt.entry.seq, SeqNo::new(1));
    assert_eq!(receipt.acks.len(), 2);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(cluster.replica(&addrs[1]).store.snapshot(), vec!["c", "d"]);
}

// ============================================================================
// Quorum Gate
// ============================================================================

#[tokio::test(start_paused = true)]
async fn no_quorum_rejects_without_burning_a_seq() {
    let (cluster, addrs) = MockCluster::new(2);
    cluster.set_down(&addrs[0], true);
    cluster.set_down(&addrs[1], true);
    let primary = Primary::spawn(addrs.clone(), cluster.clone(), fast_options());
    settle().await;

    let err = primary.append("e".into(), Some(1)).await.unwrap_err();
    match err {
        CoreError::NoQuorum { healthy, required } => {
            assert_eq!(healthy, 1);
            assert_eq!(required, 2);
        }
        other => panic!("expected NoQuorum, got {other:?}"),
    }
    assert!(primary.is_empty());

    // Recovery readmits writes, and the first seq is still 1.
    cluster.set_down(&addrs[0], false);
    settle().await;
    let receipt = primary.append("e".into(), Some(1)).await.unwrap();
    assert_eq!(receipt.entry.seq, SeqNo::new(1));
}

#[tokio::test(start_paused = true)]
async fn invalid_write_concern_rejected_before_assignment() {
    let (cluster, addrs) = MockCluster::new(2);
    let primary = Primary::spawn(addrs, cluster, fast_options());
    settle().await;

    assert!(matches!(
        primary.append("x".into(), Some(0)).await,
        Err(CoreError::InvalidWriteConcern(_))
    ));
    assert!(matches!(
        primary.append("x".into(), Some(4)).await,
        Err(CoreError::InvalidWriteConcern(_))
    ));
    assert!(primary.is_empty());
}

// ============================================================================
// Retry & Dedup
// ============================================================================

#[tokio::test(start_paused = true)]
async fn duplicate_delivery_counts_as_acknowledgement() {
    let (cluster, addrs) = MockCluster::new(1);
    let primary = Primary::spawn(addrs.clone(), cluster.clone(), fast_options());
    settle().await;

    // The replica somehow already holds seq 1 (a retry after an ack the
    // primary never observed).
    cluster.replica(&addrs[0]).store.ingest(SeqNo::new(1), "a");

    let receipt = primary.append("a".into(), Some(2)).await.unwrap();
    assert_eq!(receipt.acks, addrs);
    assert_eq!(cluster.replica(&addrs[0]).store.snapshot(), vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_until_acked() {
    let (cluster, addrs) = MockCluster::new(2);
    cluster.set_down(&addrs[0], true);
    let primary = Primary::spawn(addrs.clone(), cluster.clone(), fast_options());
    settle().await;

    let pending = {
        let primary = Arc::clone(&primary);
        tokio::spawn(async move { primary.append("m".into(), Some(3)).await })
    };

    // Let several back-off rounds elapse before recovery.
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(!pending.is_finished());
    cluster.set_down(&addrs[0], false);

    let receipt = pending.await.unwrap().unwrap();
    assert_eq!(receipt.acks.len(), 2);
    assert_eq!(cluster.replica(&addrs[0]).store.snapshot(), vec!["m"]);
}

// ============================================================================
// Convergence
// ============================================================================

#[tokio::test(start_paused = true)]
async fn all_replicas_converge_to_the_primary_log() {
    let (cluster, addrs) = MockCluster::new(3);
    cluster.set_down(&addrs[2], true);
    let primary = Primary::spawn(addrs.clone(), cluster.clone(), fast_options());
    settle().await;

    for i in 0..10 {
        primary.append(format!("m{i}"), Some(1)).await.unwrap();
    }
    cluster.set_down(&addrs[2], false);
    tokio::time::sleep(Duration::from_secs(60)).await;

    let expected = primary.snapshot();
    assert_eq!(expected.len(), 10);
    for addr in &addrs {
        assert_eq!(cluster.replica(addr).store.snapshot(), expected);
    }
}
