//! Replica liveness probing and the quorum gate.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use beryl_types::ReplicaAddr;

use crate::transport::ReplicaTransport;

/// Liveness of one replica, as reported to the health surface.
#[derive(Debug, Clone)]
pub struct ReplicaLiveness {
    pub addr: ReplicaAddr,
    pub healthy: bool,
    /// Age of the last successful probe, if any succeeded yet.
    pub last_seen: Option<Duration>,
}

/// Result of evaluating the quorum predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuorumView {
    /// Healthy node count, primary included.
    pub healthy_nodes: usize,
    /// Node count required to admit writes.
    pub required_nodes: usize,
}

impl QuorumView {
    pub fn satisfied(self) -> bool {
        self.healthy_nodes >= self.required_nodes
    }
}

struct ReplicaProbe {
    addr: ReplicaAddr,
    last_success: Mutex<Option<Instant>>,
}

/// Background prober feeding the quorum predicate.
///
/// Each replica is probed once per interval; a replica is healthy iff its
/// most recent successful probe is within the grace window. The view is
/// advisory and eventually consistent: a replica that dies right after
/// passing the gate just causes dispatcher retries, never a failed append.
pub struct HealthMonitor {
    probes: Vec<ReplicaProbe>,
    transport: Arc<dyn ReplicaTransport>,
    interval: Duration,
    grace: Duration,
}

impl HealthMonitor {
    pub fn new(
        replicas: &[ReplicaAddr],
        transport: Arc<dyn ReplicaTransport>,
        interval: Duration,
        grace: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            probes: replicas
                .iter()
                .map(|addr| ReplicaProbe {
                    addr: addr.clone(),
                    last_success: Mutex::new(None),
                })
                .collect(),
            transport,
            interval,
            grace,
        })
    }

    /// Starts the probe loop. The first round fires immediately, so the
    /// quorum view is populated as soon as replicas answer.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                monitor.probe_all().await;
            }
        })
    }

    /// Probes every replica once, concurrently.
    pub async fn probe_all(&self) {
        futures::future::join_all(self.probes.iter().map(|probe| self.probe_one(probe))).await;
    }

    async fn probe_one(&self, probe: &ReplicaProbe) {
        match self.transport.probe(&probe.addr).await {
            Ok(()) => {
                *probe.last_success.lock().unwrap() = Some(Instant::now());
                trace!(replica = %probe.addr, "probe ok");
            }
            Err(err) => {
                debug!(replica = %probe.addr, error = %err, "probe failed");
            }
        }
    }

    fn is_healthy(&self, probe: &ReplicaProbe, now: Instant) -> bool {
        probe
            .last_success
            .lock()
            .unwrap()
            .is_some_and(|at| now.duration_since(at) <= self.grace)
    }

    /// Per-replica liveness snapshot for the health surface.
    pub fn statuses(&self) -> Vec<ReplicaLiveness> {
        let now = Instant::now();
        self.probes
            .iter()
            .map(|probe| ReplicaLiveness {
                addr: probe.addr.clone(),
                healthy: self.is_healthy(probe, now),
                last_seen: probe
                    .last_success
                    .lock()
                    .unwrap()
                    .map(|at| now.duration_since(at)),
            })
            .collect()
    }

    /// Evaluates the quorum predicate: counting the primary itself, at
    /// least half the cluster (rounded up) must be healthy to admit a new
    /// write. Independent of any request's write concern.
    pub fn quorum(&self) -> QuorumView {
        let now = Instant::now();
        let healthy_replicas = self
            .probes
            .iter()
            .filter(|probe| self.is_healthy(probe, now))
            .count();
        let total_nodes = self.probes.len() + 1;

        QuorumView {
            healthy_nodes: healthy_replicas + 1,
            required_nodes: total_nodes.div_ceil(2),
        }
    }
}
