//! HTTP clients for Beryl nodes.
//!
//! Two things live here:
//! - [`HttpReplicaTransport`]: the production [`ReplicaTransport`] the
//!   primary's dispatcher and health monitor run over.
//! - [`BerylClient`]: a small client for the public surface, used by the
//!   CLI and by integration tests.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::trace;

use beryl_replication::{ReplicaTransport, ReplicateOutcome, TransportError};
use beryl_types::wire::{
    AppendRequest, AppendResponse, ErrorResponse, MessagesResponse, ReplicateRequest,
    ReplicateResponse,
};
use beryl_types::{ReplicaAddr, SeqNo};

// ============================================================================
// Replica Transport
// ============================================================================

/// `ReplicaTransport` over HTTP/JSON.
///
/// Replicate calls carry no overall timeout: a replica configured with an
/// artificial ingress delay must be waited out, not timed out into a
/// retry. Probes are bounded so a hung replica reads as unhealthy.
pub struct HttpReplicaTransport {
    client: reqwest::Client,
    probe_timeout: Duration,
}

impl HttpReplicaTransport {
    pub fn new() -> Self {
        Self {
            // Connection establishment is bounded; only the response wait
            // is open-ended for replicate calls.
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(1))
                .build()
                .expect("default reqwest client"),
            probe_timeout: Duration::from_millis(800),
        }
    }

    /// Overrides how long a health probe may take before it counts as
    /// failed.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

impl Default for HttpReplicaTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplicaTransport for HttpReplicaTransport {
    async fn replicate(
        &self,
        replica: &ReplicaAddr,
        seq: SeqNo,
        payload: &str,
    ) -> Result<ReplicateOutcome, TransportError> {
        let url = format!("{replica}/replicate");
        let body = ReplicateRequest {
            msg: payload.to_string(),
            seq: seq.into(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body: ReplicateResponse = response
            .json()
            .await
            .map_err(|err| TransportError::Body(err.to_string()))?;

        trace!(%replica, %seq, duplicate = body.duplicate, "replicate ok");
        Ok(ReplicateOutcome {
            duplicate: body.duplicate,
        })
    }

    async fn probe(&self, replica: &ReplicaAddr) -> Result<(), TransportError> {
        let url = format!("{replica}/health");
        let response = self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Public Surface Client
// ============================================================================

/// Errors from the public-surface client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response not read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The node answered with a structured error body.
    #[error("{code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
}

/// Client for a node's public HTTP surface.
pub struct BerylClient {
    client: reqwest::Client,
    base_url: String,
}

impl BerylClient {
    /// Creates a client for the node at `base_url`
    /// (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Appends a message, waiting for the given write concern (`None`
    /// means all nodes). May block as long as the cluster needs.
    pub async fn append(&self, msg: &str, w: Option<u32>) -> Result<AppendResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&AppendRequest {
                msg: msg.to_string(),
                w,
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Fetches the node's visible log.
    pub async fn messages(&self) -> Result<Vec<String>, ClientError> {
        let response = self
            .client
            .get(format!("{}/messages", self.base_url))
            .send()
            .await?;
        let body: MessagesResponse = Self::decode(response).await?;
        Ok(body.messages)
    }

    /// Fetches the node's health document, undecoded.
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Prefer the node's structured error body when there is one.
        match response.json::<ErrorResponse>().await {
            Ok(body) => Err(ClientError::Api {
                status: status.as_u16(),
                code: body.error,
                message: body.message,
            }),
            Err(err) => Err(ClientError::Request(err)),
        }
    }
}
