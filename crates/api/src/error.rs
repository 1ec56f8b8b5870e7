//! API error types with HTTP response mapping.
//!
//! Every error leaves the server as the frontend's failure envelope:
//! `{success:false, error, message, warning?, debug?}`. Orchestration
//! failures carry the partial-state debug block so support staff can
//! resume a half-completed booking by hand.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use providers::{GatewayError, ProviderError};
use saga::{SagaError, SagaFailure};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
    /// Orchestration run aborted.
    Saga(SagaFailure),
    /// Booking provider call failed outside a saga run.
    Provider(ProviderError),
    /// Payment gateway call failed outside a saga run.
    Gateway(GatewayError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                envelope(StatusCode::BAD_REQUEST, "bad_request", &message, None)
            }
            ApiError::NotFound(message) => {
                envelope(StatusCode::NOT_FOUND, "not_found", &message, None)
            }
            ApiError::Saga(failure) => saga_failure_response(failure),
            ApiError::Provider(err) => {
                let status = match &err {
                    ProviderError::Auth(_) => StatusCode::BAD_GATEWAY,
                    ProviderError::Lookup(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_GATEWAY,
                };
                envelope(status, "booking_provider_error", &err.to_string(), None)
            }
            ApiError::Gateway(err) => {
                let status = match &err {
                    GatewayError::Api(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::BAD_GATEWAY,
                };
                envelope(status, "payment_gateway_error", &err.to_string(), None)
            }
        }
    }
}

fn saga_failure_response(failure: SagaFailure) -> Response {
    let status = match &failure.error {
        SagaError::ProviderAuth(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    };
    tracing::warn!(error = %failure.error, status = %status, "request failed");

    let mut body = serde_json::json!({
        "success": false,
        "error": failure.error.label(),
        "message": failure.error.to_string(),
        "debug": failure.debug,
    });
    if let Some(warning) = failure.warning {
        body["warning"] = serde_json::Value::String(warning);
    }
    (status, axum::Json(body)).into_response()
}

fn envelope(status: StatusCode, error: &str, message: &str, warning: Option<String>) -> Response {
    let mut body = serde_json::json!({
        "success": false,
        "error": error,
        "message": message,
    });
    if let Some(warning) = warning {
        body["warning"] = serde_json::Value::String(warning);
    }
    (status, axum::Json(body)).into_response()
}

impl From<SagaFailure> for ApiError {
    fn from(failure: SagaFailure) -> Self {
        ApiError::Saga(failure)
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError::Provider(err)
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Gateway(err)
    }
}
