//! HTTP error mapping.

use alloy_primitives::Address;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rpsls_chain::ChainError;
use rpsls_core::GameError;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Game not found: {0}")]
    NotFound(Address),

    #[error("A {0} transaction is already pending")]
    Pending(String),

    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Game(GameError::NotAParticipant(_)) => StatusCode::FORBIDDEN,
            AppError::Game(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Chain(ChainError::NotConnected) => StatusCode::UNAUTHORIZED,
            AppError::Chain(ChainError::ContractNotFound(_)) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Chain(ChainError::Read { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Chain(_) => StatusCode::BAD_GATEWAY,
            AppError::Pending(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(GameError::CommitmentMismatch).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(GameError::NotAParticipant(Address::ZERO)).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(ChainError::NotConnected).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(ChainError::Reverted("boom".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(ChainError::Read {
                field: "j1",
                reason: "timeout".into()
            })
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Pending("play".into()).status(),
            StatusCode::CONFLICT
        );
    }
}
