//! Replica node HTTP surface.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use beryl_replication::ReplicaStore;
use beryl_types::SeqNo;
use beryl_types::wire::{
    MessagesResponse, ReplicaHealthResponse, ReplicateRequest, ReplicateResponse,
};

use crate::error::ApiError;

/// Shared state of a replica node.
#[derive(Clone)]
pub struct ReplicaState {
    store: Arc<ReplicaStore>,
    ingress_delay: Duration,
}

impl ReplicaState {
    pub fn new(ingress_delay: Duration) -> Self {
        Self {
            store: Arc::new(ReplicaStore::new()),
            ingress_delay,
        }
    }

    /// The underlying store, for tests that want to inspect it directly.
    pub fn store(&self) -> &Arc<ReplicaStore> {
        &self.store
    }
}

/// Builds the replica's router.
pub fn router(state: ReplicaState) -> Router {
    Router::new()
        .route("/replicate", axum::routing::post(replicate))
        .route("/messages", get(list_messages))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /replicate`: at-least-once ingress with exactly-once apply.
///
/// Known sequence numbers short-circuit before the artificial delay, so a
/// primary retrying an already-delivered entry gets its answer fast.
async fn replicate(
    State(state): State<ReplicaState>,
    payload: Result<Json<ReplicateRequest>, JsonRejection>,
) -> Result<Json<ReplicateResponse>, ApiError> {
    let Json(request) = payload?;
    if request.seq == 0 {
        return Err(ApiError::InvalidSeq);
    }
    let seq = SeqNo::from(request.seq);

    if state.store.contains(seq) {
        return Ok(Json(ReplicateResponse {
            status: "ok".to_string(),
            duplicate: true,
        }));
    }

    if !state.ingress_delay.is_zero() {
        tokio::time::sleep(state.ingress_delay).await;
    }

    let outcome = state.store.ingest(seq, &request.msg);
    Ok(Json(ReplicateResponse {
        status: "ok".to_string(),
        duplicate: outcome.duplicate,
    }))
}

/// `GET /messages`: the applied prefix; buffered entries stay invisible.
async fn list_messages(State(state): State<ReplicaState>) -> Json<MessagesResponse> {
    Json(MessagesResponse {
        messages: state.store.snapshot(),
    })
}

/// `GET /health`: applied length plus the configured ingress delay.
async fn health(State(state): State<ReplicaState>) -> Json<ReplicaHealthResponse> {
    Json(ReplicaHealthResponse {
        status: "ok".to_string(),
        delay_ms: state.ingress_delay.as_millis() as u64,
        count: state.store.applied_len(),
    })
}
