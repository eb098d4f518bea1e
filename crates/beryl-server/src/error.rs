//! JSON error mapping for the HTTP surface.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use beryl_replication::CoreError;
use beryl_types::wire::ErrorResponse;

/// Errors a handler can surface to a client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body was missing, not JSON, or the wrong shape.
    #[error("malformed request: {0}")]
    Malformed(#[from] JsonRejection),

    /// `seq` values start at 1.
    #[error("seq must be a positive integer")]
    InvalidSeq,

    /// Engine-level rejection (invalid write concern, no quorum).
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Malformed(_) | ApiError::InvalidSeq => {
                (StatusCode::BAD_REQUEST, "malformed_request")
            }
            ApiError::Core(CoreError::InvalidWriteConcern(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_write_concern")
            }
            ApiError::Core(CoreError::NoQuorum { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, "no_quorum")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
