//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Request input failed validation.
    BadRequest(String),

    /// Ordering logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::ProductNotFound(_) | DomainError::OrderNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        DomainError::NoActiveOrder => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::AmountOverflow(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        DomainError::Payment(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        DomainError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
