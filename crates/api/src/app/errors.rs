use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockledger_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(_)
        | DomainError::InvalidMovement(_)
        | DomainError::DuplicateKey(_)
        | DomainError::InsufficientStock { .. } => json_error(StatusCode::BAD_REQUEST, err.kind(), err.to_string()),
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, err.kind(), err.to_string()),
        DomainError::Referenced(_) => json_error(StatusCode::CONFLICT, err.kind(), err.to_string()),
        DomainError::Busy(msg) => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "busy",
                "message": msg,
                "retryable": true,
            })),
        )
            .into_response(),
        DomainError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "internal storage error",
            )
        }
    }
}

/// Malformed path, query or body: reported like any other validation failure.
pub fn rejection_to_response(rejection: impl std::fmt::Display) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
