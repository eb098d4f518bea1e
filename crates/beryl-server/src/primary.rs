//! Primary node HTTP surface.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use beryl_replication::Primary;
use beryl_types::wire::{
    AckEntry, AppendRequest, AppendResponse, MessagesResponse, PrimaryHealthResponse,
    SecondaryStatus,
};

use crate::error::ApiError;

/// Builds the primary's router.
pub fn router(primary: Arc<Primary>) -> Router {
    Router::new()
        .route("/messages", get(list_messages).post(append_message))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(primary)
}

/// `POST /messages`: append one message and wait out its write concern.
async fn append_message(
    State(primary): State<Arc<Primary>>,
    payload: Result<Json<AppendRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AppendResponse>), ApiError> {
    let Json(request) = payload?;
    let receipt = primary.append(request.msg, request.w).await?;

    info!(
        seq = %receipt.entry.seq,
        w = %receipt.write_concern,
        acks = receipt.acks.len(),
        duration_ms = receipt.elapsed.as_millis() as u64,
        "append served"
    );

    let response = AppendResponse {
        messages: primary.snapshot(),
        acks: receipt
            .acks
            .iter()
            .map(|addr| AckEntry {
                secondary: addr.to_string(),
                ack: true,
            })
            .collect(),
        w: receipt.write_concern.as_u32(),
        duration_ms: receipt.elapsed.as_millis() as u64,
        seq: receipt.entry.seq.as_u64(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /messages`: the full committed log.
async fn list_messages(State(primary): State<Arc<Primary>>) -> Json<MessagesResponse> {
    Json(MessagesResponse {
        messages: primary.snapshot(),
    })
}

/// `GET /health`: log size plus the health monitor's replica view.
async fn health(State(primary): State<Arc<Primary>>) -> Json<PrimaryHealthResponse> {
    let secondary_statuses = primary
        .replica_statuses()
        .into_iter()
        .map(|liveness| SecondaryStatus {
            addr: liveness.addr.to_string(),
            healthy: liveness.healthy,
            last_seen_ms: liveness.last_seen.map(|age| age.as_millis() as u64),
        })
        .collect();

    Json(PrimaryHealthResponse {
        status: "ok".to_string(),
        count: primary.len(),
        secondaries: primary
            .secondaries()
            .iter()
            .map(ToString::to_string)
            .collect(),
        secondary_statuses,
    })
}
