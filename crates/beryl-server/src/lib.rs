//! HTTP surface for Beryl nodes.
//!
//! One router per node role:
//! - [`primary::router`]: `POST /messages`, `GET /messages`, `GET /health`
//! - [`replica::router`]: `POST /replicate`, `GET /messages`, `GET /health`
//!
//! Every body is JSON; every error body is `{"error", "message"}`.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

pub mod error;
pub mod primary;
pub mod replica;

pub use error::ApiError;
pub use replica::ReplicaState;

/// Binds a listener, logging the resolved address. Passing port 0 picks a
/// free port; read it back with [`TcpListener::local_addr`].
pub async fn bind(addr: &str) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

/// Serves `router` on `listener` until the process stops.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
