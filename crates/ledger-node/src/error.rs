use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_core::LedgerError;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request itself could not be honoured by the node.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// A candidate chain failed validation or has a foreign genesis.
    #[error("candidate chain rejected: {0}")]
    Rejected(LedgerError),
    /// The chain moved while a block was being mined.
    #[error("block is stale: {0}")]
    Stale(LedgerError),
    #[error("{0}")]
    BadRequest(String),
    #[error("peer request failed: {0}")]
    Peer(#[from] reqwest::Error),
    #[error("mining task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(err) => match err {
                LedgerError::InvalidAmount { .. } | LedgerError::InsufficientBalance { .. } => {
                    StatusCode::BAD_REQUEST
                }
                LedgerError::MiningCancelled => StatusCode::CONFLICT,
                err if err.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Stale(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Peer(_) => StatusCode::BAD_GATEWAY,
            ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(%status, err = %self, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
