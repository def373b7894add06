use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller-supplied input lacks required structure. Raised before any oracle call.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    /// No oracle credential is configured.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// The oracle could not be reached or answered with a non-2xx status.
    #[error("Oracle call failed: {0}")]
    OracleCall(String),

    /// The oracle answered, but the payload was not the expected JSON shape.
    #[error("Malformed oracle response: {0}")]
    MalformedOracleResponse(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Classifies an oracle failure into the call / malformed-payload kinds.
    pub fn from_oracle(context: &str, err: LlmError) -> Self {
        if err.is_malformed() {
            AppError::MalformedOracleResponse(format!("{context}: {err}"))
        } else {
            AppError::OracleCall(format!("{context}: {err}"))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::MissingCredential(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "MISSING_CREDENTIAL",
                msg.clone(),
            ),
            AppError::OracleCall(msg) => {
                tracing::error!("Oracle call error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "ORACLE_ERROR",
                    "The inference service could not be reached".to_string(),
                )
            }
            AppError::MalformedOracleResponse(msg) => {
                tracing::error!("Malformed oracle response: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_ORACLE_RESPONSE",
                    "The inference service returned an unusable response".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
