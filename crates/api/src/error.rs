//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use gateway::GatewayError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid customer identity.
    Unauthorized(String),
    /// Checkout/payment domain error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        // Validation: rejected before any external call.
        CheckoutError::EmptyCart
        | CheckoutError::InvalidAddress(_)
        | CheckoutError::UnknownProduct(_)
        | CheckoutError::Cart(_)
        | CheckoutError::Catalog(_) => (StatusCode::BAD_REQUEST, err.to_string()),

        // Concurrency and state conflicts: the caller must re-fetch.
        CheckoutError::OutOfStock { .. }
        | CheckoutError::DuplicateChargeAttempt(_)
        | CheckoutError::OrderNotPayable { .. }
        | CheckoutError::SettlementConflict { .. }
        | CheckoutError::Order(_) => (StatusCode::CONFLICT, err.to_string()),

        CheckoutError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),

        CheckoutError::Store(store_err) => match store_err {
            StoreError::StaleOrderVersion { .. } | StoreError::Transition(_) => {
                (StatusCode::CONFLICT, err.to_string())
            }
            StoreError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        },

        CheckoutError::Gateway(gateway_err) => match gateway_err {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, err.to_string()),
            _ => (StatusCode::BAD_GATEWAY, err.to_string()),
        },
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Checkout(CheckoutError::Store(err))
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Checkout(CheckoutError::Gateway(err))
    }
}
