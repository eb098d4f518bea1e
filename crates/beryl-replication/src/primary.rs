//! The write coordinator: the primary node's engine facade.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;

use beryl_types::{LogEntry, ReplicaAddr, WriteConcern};

use crate::acks::AckRegistry;
use crate::dispatcher::{BackoffPolicy, Dispatcher};
use crate::error::{CoreError, CoreResult};
use crate::health::{HealthMonitor, ReplicaLiveness};
use crate::ledger::Ledger;
use crate::transport::ReplicaTransport;

/// Tuning knobs for a primary. Defaults match the reference deployment.
#[derive(Debug, Clone, Copy)]
pub struct PrimaryOptions {
    pub backoff: BackoffPolicy,
    /// Health probe cadence.
    pub health_interval: Duration,
    /// Grace window before an unresponsive replica counts as unhealthy.
    pub health_grace: Duration,
}

impl Default for PrimaryOptions {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            health_interval: Duration::from_secs(1),
            health_grace: Duration::from_secs(3),
        }
    }
}

/// What an append call observed by the time it returned.
#[derive(Debug, Clone)]
pub struct AppendReceipt {
    /// The committed entry, sequence number included.
    pub entry: LogEntry,

    /// The write concern the request was served with (defaulted to `N+1`
    /// when the client sent none).
    pub write_concern: WriteConcern,

    /// Distinct replicas that had acknowledged at the moment of return.
    /// May keep growing afterwards; replication never stops at `W`.
    pub acks: Vec<ReplicaAddr>,

    /// Wall-clock time spent in the append.
    pub elapsed: Duration,
}

/// The primary node: sequence assignment, fan-out, write-concern waits,
/// and the quorum gate, over any [`ReplicaTransport`].
pub struct Primary {
    ledger: Ledger,
    dispatcher: Dispatcher,
    acks: Arc<AckRegistry>,
    health: Arc<HealthMonitor>,
    replicas: Vec<ReplicaAddr>,
}

impl Primary {
    /// Builds the engine and spawns its background tasks: one replication
    /// worker per replica plus the health monitor.
    pub fn spawn(
        replicas: Vec<ReplicaAddr>,
        transport: Arc<dyn ReplicaTransport>,
        options: PrimaryOptions,
    ) -> Arc<Self> {
        let acks = Arc::new(AckRegistry::new());
        let dispatcher = Dispatcher::spawn(
            &replicas,
            Arc::clone(&transport),
            Arc::clone(&acks),
            options.backoff,
        );
        let health = HealthMonitor::new(
            &replicas,
            transport,
            options.health_interval,
            options.health_grace,
        );
        health.spawn();

        info!(replicas = replicas.len(), "primary engine started");

        Arc::new(Self {
            ledger: Ledger::new(),
            dispatcher,
            acks,
            health,
            replicas,
        })
    }

    /// Appends one message with write concern `w` (`None` means all nodes).
    ///
    /// Validation and the quorum gate run before a sequence number is
    /// assigned, so a rejected append burns nothing. Once assigned, the
    /// entry is committed and will reach every replica eventually; the
    /// wait only decides when this call returns. Each append waits on its
    /// own registry entry, so a blocked high-`w` request never delays a
    /// concurrent low-`w` one.
    pub async fn append(&self, payload: String, w: Option<u32>) -> CoreResult<AppendReceipt> {
        let started = Instant::now();

        let write_concern = match w {
            Some(w) => WriteConcern::for_cluster(w, self.replicas.len())?,
            None => WriteConcern::full(self.replicas.len()),
        };

        let quorum = self.health.quorum();
        if !quorum.satisfied() {
            return Err(CoreError::NoQuorum {
                healthy: quorum.healthy_nodes,
                required: quorum.required_nodes,
            });
        }

        let entry = self.ledger.assign(payload);
        let waiter = self
            .acks
            .register(entry.seq, write_concern.replica_acks_required());
        self.dispatcher.fan_out(&entry);

        waiter.wait().await;
        let acks = waiter.take_acks();

        info!(
            seq = %entry.seq,
            w = %write_concern,
            acks = acks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "append acknowledged"
        );

        Ok(AppendReceipt {
            entry,
            write_concern,
            acks,
            elapsed: started.elapsed(),
        })
    }

    /// Copy of the committed payloads in sequence order. Entries are
    /// visible here as soon as they are assigned, before any replica ack.
    pub fn snapshot(&self) -> Vec<String> {
        self.ledger.snapshot()
    }

    /// Current log length.
    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    /// Configured replica addresses, in configuration order.
    pub fn secondaries(&self) -> &[ReplicaAddr] {
        &self.replicas
    }

    /// Per-replica liveness as seen by the health monitor.
    pub fn replica_statuses(&self) -> Vec<ReplicaLiveness> {
        self.health.statuses()
    }
}
